use geom::Distance;
use markup::render::{enter_corner_radius, raised_meshes, BatchKind};
use markup::style::{Filler3D, FillerStyle, LineStyle, MaterialType};
use markup::{
    Alignment, ConnectionStyle, FillerContour, FillerVertex, LinePair, Markup, MarkupConfig,
    NodeID, PointID, PointPair, SegmentID, StaticNetwork,
};

fn crossing() -> Markup {
    let network = StaticNetwork::crossing(NodeID(1), 4, 2);
    Markup::new(NodeID(1), &network, MarkupConfig::default()).unwrap()
}

fn pt(enter: u16, num: u8) -> PointID {
    PointID::new(SegmentID(enter), num)
}

fn at(point: PointID) -> FillerVertex {
    FillerVertex::Enter {
        point,
        alignment: Alignment::Centre,
    }
}

fn regular() -> ConnectionStyle {
    ConnectionStyle::Regular(LineStyle::default_solid())
}

/// From the east enter's north corner, across the north enter, and back.
fn corner_triangle(markup: &Markup) -> FillerContour {
    let mut contour = FillerContour::new();
    assert!(!contour.add(markup, at(pt(1, 5))).unwrap());
    assert!(!contour.add(markup, at(pt(2, 1))).unwrap());
    assert!(!contour.add(markup, at(pt(2, 5))).unwrap());
    assert!(contour.add(markup, at(pt(1, 5))).unwrap());
    contour
}

#[test]
fn closing_a_triangle() {
    let markup = crossing();
    let contour = corner_triangle(&markup);
    assert!(contour.is_complete());
    assert_eq!(contour.processed_count(), 3);
    assert_eq!(contour.raw_count(), 3);
    assert!(!contour.is_median(&markup));
    assert_eq!(
        contour.processed_vertices(),
        &vec![at(pt(1, 5)), at(pt(2, 1)), at(pt(2, 5))]
    );
    assert!(contour
        .trajectories_processed(&markup)
        .iter()
        .all(|t| t.is_some()));
    assert!(contour.contains_point(pt(2, 1)));
    assert!(contour.contains_enter(SegmentID(2)));
    assert!(!contour.contains_enter(SegmentID(3)));

    // Nothing more can be added once it's closed
    let mut closed = contour.clone();
    assert!(closed.add(&markup, at(pt(3, 1))).is_err());
    assert!(closed.next_candidates(&markup).is_empty());
}

#[test]
fn two_sides_never_close() {
    let markup = crossing();
    let mut contour = FillerContour::new();
    contour.add(&markup, at(pt(1, 5))).unwrap();
    contour.add(&markup, at(pt(2, 1))).unwrap();
    assert!(contour.add(&markup, at(pt(1, 5))).is_err());
    assert!(!contour.is_complete());
    assert_eq!(contour.raw_vertices().len(), 2);

    // Undoing the jump across the node restores the plain starting point
    contour.remove(&markup);
    assert_eq!(contour.raw_vertices(), &vec![at(pt(1, 5))]);
}

#[test]
fn candidates() {
    let mut markup = crossing();
    let empty = FillerContour::new();
    assert_eq!(empty.next_candidates(&markup).len(), 20);

    let horizontal = markup
        .add_connection(PointPair::new(pt(1, 1), pt(3, 5)), regular())
        .unwrap();
    let vertical = markup
        .add_connection(PointPair::new(pt(2, 5), pt(4, 1)), regular())
        .unwrap();
    let crossing = FillerVertex::Intersection(LinePair::new(horizontal, vertical));
    assert!(FillerContour::begin_candidates(&markup).contains(&crossing));

    let mut contour = FillerContour::new();
    contour.add(&markup, at(pt(1, 1))).unwrap();
    let next = contour.next_candidates(&markup);
    assert!(next.contains(&crossing));
    assert!(next.contains(&at(pt(1, 2))));
    assert!(next.contains(&at(pt(3, 5))));
    assert!(!next.contains(&at(pt(1, 1))));

    contour.add(&markup, at(pt(2, 1))).unwrap();
    assert_eq!(contour.min_max_num(&markup, pt(2, 3)), (1, 6));
    assert!(contour.is_available(pt(2, 3)));
}

#[test]
fn outline_through_a_crossing() {
    let mut markup = crossing();
    let horizontal = markup
        .add_connection(PointPair::new(pt(1, 1), pt(3, 5)), regular())
        .unwrap();
    let vertical = markup
        .add_connection(PointPair::new(pt(2, 5), pt(4, 1)), regular())
        .unwrap();
    let crossing = FillerVertex::Intersection(LinePair::new(horizontal, vertical));

    let mut contour = FillerContour::new();
    contour.add(&markup, crossing).unwrap();
    contour.add(&markup, at(pt(3, 5))).unwrap();
    contour.add(&markup, at(pt(4, 1))).unwrap();
    assert!(contour.add(&markup, crossing).unwrap());
    assert_eq!(contour.processed_count(), 3);
    assert!(contour.contains_line(horizontal));
    assert!(contour.contains_line(vertical));

    let id = markup
        .add_filler(contour, FillerStyle::default_stripe())
        .unwrap();
    assert_eq!(markup.get_line_dependences(vertical).fillers, 1);

    // Without the crossing, only two points are left, so the filler goes
    markup.remove_connect(vertical).unwrap();
    assert!(markup.try_get_filler(id).is_none());
}

#[test]
fn fillers_survive_losing_a_line() {
    let mut markup = crossing();
    let side = markup
        .add_connection(PointPair::new(pt(1, 5), pt(2, 1)), regular())
        .unwrap();
    let contour = corner_triangle(&markup);
    assert!(contour.contains_line(side));
    let id = markup
        .add_filler(contour, FillerStyle::raised(MaterialType::Grass))
        .unwrap();

    markup.remove_connect(side).unwrap();
    let filler = markup.try_get_filler(id).unwrap();
    assert_eq!(filler.contour.processed_count(), 3);
    assert!(markup.try_get_line(side).is_none());
    assert!(filler.contour.is_valid(&markup));

    let batches = markup.render_batches();
    assert!(batches
        .iter()
        .any(|b| b.kind == BatchKind::Surface(MaterialType::Grass)));
    assert!(batches
        .iter()
        .any(|b| b.kind == BatchKind::Surface(MaterialType::Pavement)));
}

#[test]
fn unclosed_outlines_are_rejected() {
    let mut markup = crossing();
    let mut contour = FillerContour::new();
    contour.add(&markup, at(pt(1, 5))).unwrap();
    contour.add(&markup, at(pt(2, 1))).unwrap();
    assert!(markup
        .add_filler(contour, FillerStyle::default_stripe())
        .is_err());
    assert_eq!(markup.fillers().count(), 0);
}

#[test]
fn candidates_never_cross_drawn_sides() {
    let mut markup = crossing();
    // A # shape: two lines each way, crossing at (+-6, +-6)
    let south = markup
        .add_connection(PointPair::new(pt(1, 1), pt(3, 5)), regular())
        .unwrap();
    let north = markup
        .add_connection(PointPair::new(pt(1, 5), pt(3, 1)), regular())
        .unwrap();
    let west = markup
        .add_connection(PointPair::new(pt(2, 5), pt(4, 1)), regular())
        .unwrap();
    let east = markup
        .add_connection(PointPair::new(pt(2, 1), pt(4, 5)), regular())
        .unwrap();
    let start = FillerVertex::Intersection(LinePair::new(south, west));

    // Around three sides of the middle square
    let mut contour = FillerContour::new();
    contour.add(&markup, start).unwrap();
    contour
        .add(&markup, FillerVertex::Intersection(LinePair::new(south, east)))
        .unwrap();
    contour
        .add(&markup, FillerVertex::Intersection(LinePair::new(east, north)))
        .unwrap();
    let last = FillerVertex::Intersection(LinePair::new(north, west));
    contour.add(&markup, last).unwrap();

    // Going south along the west line, the south side already drawn is in the way
    let (t, min_t, max_t) = contour.min_max_t(&markup, &last, west);
    let blocked = markup.intersect(west, south).t_for(west).unwrap();
    assert!(min_t < t && t < max_t);
    assert!(blocked == min_t || blocked == max_t);
    let beyond = if west.first() == pt(4, 1) { 0.0 } else { 1.0 };
    assert!(beyond < min_t || beyond > max_t);

    let next = contour.next_candidates(&markup);
    assert!(next.contains(&start));
    assert!(next.contains(&at(pt(2, 5))));
    assert!(!next.contains(&at(pt(4, 1))));
    // Nothing further along the side just drawn, either
    assert!(!next.contains(&at(pt(3, 1))));

    assert!(contour.add(&markup, start).unwrap());
    assert_eq!(contour.processed_count(), 4);
    assert!(!contour.is_median(&markup));
}

#[test]
fn median_corners() {
    let markup = crossing();
    // Along the north enter in two steps, over to the east enter, and back
    let mut median = FillerContour::new();
    for point in [pt(2, 1), pt(2, 3), pt(2, 5), pt(1, 5)] {
        assert!(!median.add(&markup, at(point)).unwrap());
    }
    assert!(median.add(&markup, at(pt(2, 1))).unwrap());
    assert!(median.is_median(&markup));
    assert_eq!(median.processed_count(), 4);
    // The outline closes onto the plain starting point without doubling back
    assert_eq!(median.raw_vertices()[0], at(pt(2, 1)));
    assert!(median
        .trajectories_processed(&markup)
        .iter()
        .all(|t| t.is_some()));

    let plain = corner_triangle(&markup);
    assert!(!plain.is_median(&markup));

    let sharp = Filler3D {
        median_corner_radius: Distance::ZERO,
        ..Filler3D::default()
    };
    let round = Filler3D {
        median_corner_radius: Distance::meters(1.0),
        ..Filler3D::default()
    };
    assert_eq!(enter_corner_radius(&markup, &median, &round), Distance::meters(1.0));
    assert_eq!(
        enter_corner_radius(&markup, &plain, &round),
        round.corner_radius
    );

    // Only the median's shape depends on the median radius
    let sharp_median = raised_meshes(&markup, &median, MaterialType::Grass, &sharp);
    let round_median = raised_meshes(&markup, &median, MaterialType::Grass, &round);
    assert!(!sharp_median.is_empty());
    assert_ne!(sharp_median[0].vertices, round_median[0].vertices);
    assert_eq!(
        raised_meshes(&markup, &plain, MaterialType::Grass, &sharp)[0].vertices,
        raised_meshes(&markup, &plain, MaterialType::Grass, &round)[0].vertices
    );
}

#[test]
fn removing_merges_pinned_points() {
    let markup = crossing();
    let mut contour = FillerContour::new();
    contour.add(&markup, at(pt(3, 5))).unwrap();
    contour.add(&markup, at(pt(4, 1))).unwrap();
    let before = contour.raw_vertices().clone();
    assert_eq!(before.len(), 2);

    // Jumping on to another enter pins the middle point onto a second connector
    contour.add(&markup, at(pt(1, 5))).unwrap();
    let raw = contour.raw_vertices();
    assert_eq!(raw.len(), 4);
    assert_eq!(raw[1].point(), Some(pt(4, 1)));
    assert_eq!(raw[2].point(), Some(pt(4, 1)));
    assert_ne!(raw[1], raw[2]);

    contour.remove(&markup);
    assert_eq!(contour.raw_vertices(), &before);
    assert_eq!(
        contour.processed_vertices(),
        &vec![at(pt(3, 5)), at(pt(4, 1))]
    );
    assert_eq!(contour.raw_count(), 1);
}
