use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use geom::Distance;
use markup::style::LineStyle;
use markup::{
    ConnectionStyle, Markup, MarkupConfig, NodeID, PointID, PointPair, SegmentID, StaticNetwork,
};

fn random_point(rng: &mut XorShiftRng, arms: u16) -> PointID {
    PointID::new(SegmentID(rng.gen_range(1..=arms)), rng.gen_range(1..=5))
}

/// Lots of random lines and point adjustments, checking that the caches never go stale.
#[test]
fn random_edits_keep_caches_fresh() {
    let arms = 5;
    let network = StaticNetwork::crossing(NodeID(1), arms as usize, 2);
    let mut markup = Markup::new(NodeID(1), &network, MarkupConfig::default()).unwrap();
    let mut rng = XorShiftRng::seed_from_u64(42);

    for _ in 0..200 {
        match rng.gen_range(0..3) {
            0 => {
                let a = random_point(&mut rng, arms);
                let b = random_point(&mut rng, arms);
                if a.enter != b.enter {
                    markup
                        .add_connection(
                            PointPair::new(a, b),
                            ConnectionStyle::Regular(LineStyle::default_solid()),
                        )
                        .unwrap();
                }
            }
            1 => {
                let point = random_point(&mut rng, arms);
                let offset = Distance::meters(rng.gen_range(-1.0..1.0));
                markup.set_point_offset(point, offset).unwrap();
            }
            _ => {
                let ids: Vec<_> = markup.lines().map(|l| l.id).collect();
                if !ids.is_empty() {
                    let id = ids[rng.gen_range(0..ids.len())];
                    markup.remove_connect(id).unwrap();
                }
            }
        }

        let ids: Vec<_> = markup.lines().map(|l| l.id).collect();
        for a in &ids {
            for b in &ids {
                if a < b {
                    // Whatever is cached must match a fresh calculation
                    let cached = markup.intersect(*a, *b);
                    assert_eq!(cached, markup.intersect(*b, *a));
                    let fresh = markup::LineIntersection::calculate(
                        cached.pair,
                        markup.try_get_line(cached.pair.first()).unwrap().trajectory(),
                        markup.try_get_line(cached.pair.second()).unwrap().trajectory(),
                    );
                    assert_eq!(cached, fresh);
                }
            }
        }
    }

    for batch in markup.render_batches() {
        assert!(batch
            .indices
            .iter()
            .all(|i| (*i as usize) < batch.vertices.len()));
    }
}
