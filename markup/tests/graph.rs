use geom::{Distance, Pt2D};
use markup::style::{CrosswalkStyle, LineStyle, StopLineStyle};
use markup::{
    ConnectionStyle, LineRule, LineType, Markup, MarkupConfig, NodeID, PointID, PointPair,
    RuleEdge, SegmentID, StaticNetwork,
};

fn crossing() -> (StaticNetwork, Markup) {
    let network = StaticNetwork::crossing(NodeID(1), 4, 2);
    let markup = Markup::new(NodeID(1), &network, MarkupConfig::default()).unwrap();
    (network, markup)
}

fn pt(enter: u16, num: u8) -> PointID {
    PointID::new(SegmentID(enter), num)
}

fn regular() -> ConnectionStyle {
    ConnectionStyle::Regular(LineStyle::default_solid())
}

fn close(a: Pt2D, b: Pt2D) -> bool {
    a.approx_eq(b, Distance::meters(0.1))
}

#[test]
fn enters_and_points() {
    let (_, markup) = crossing();
    let ids: Vec<SegmentID> = markup.enters().iter().map(|e| e.id).collect();
    assert_eq!(
        ids,
        vec![SegmentID(1), SegmentID(2), SegmentID(3), SegmentID(4)]
    );
    for enter in markup.enters() {
        assert_eq!(enter.point_count(), 5);
    }

    // Looking into the node from the east, the first point is on the south side
    assert!(close(
        markup.get_point(pt(1, 1)).unwrap().position(),
        Pt2D::new(10.0, -6.0)
    ));
    // ... and straight across from it is the last point of the west enter
    assert!(close(
        markup.get_point(pt(3, 5)).unwrap().position(),
        Pt2D::new(-10.0, -6.0)
    ));
    assert!(close(
        markup.get_point(pt(2, 1)).unwrap().position(),
        Pt2D::new(6.0, 10.0)
    ));
    assert!(markup.get_point(pt(1, 6)).is_none());
    assert!(markup.get_point(pt(1, 0)).is_none());

    assert_eq!(markup.next_enter(SegmentID(4)).unwrap().id, SegmentID(1));
    assert_eq!(markup.prev_enter(SegmentID(1)).unwrap().id, SegmentID(4));

    // One side along each enter, one curve between neighbors
    assert_eq!(markup.contour().len(), 8);
    assert!(markup.radius() >= Distance::meters(10.0));
    assert!(markup.is_empty());
}

#[test]
fn connections_are_symmetric() {
    let (_, mut markup) = crossing();
    let a = pt(1, 1);
    let b = pt(3, 5);
    let id1 = markup
        .add_connection(PointPair::new(a, b), regular())
        .unwrap();
    let id2 = markup
        .add_connection(PointPair::new(b, a), regular())
        .unwrap();
    assert_eq!(id1, id2);
    assert_eq!(markup.lines().count(), 1);
    assert!(markup.exist_connection(PointPair::new(b, a)));

    let traj = markup.try_get_line(id1).unwrap().trajectory();
    assert!(close(traj.position(0.5), Pt2D::new(0.0, -6.0)));
    assert!(!markup.is_empty());
}

#[test]
fn line_kinds_follow_enters() {
    let (_, mut markup) = crossing();
    let stop = ConnectionStyle::Stop(StopLineStyle::default_solid());

    assert!(markup
        .add_connection(PointPair::new(pt(1, 1), pt(1, 3)), regular())
        .is_err());
    assert!(markup
        .add_connection(PointPair::new(pt(1, 1), pt(2, 3)), stop)
        .is_err());
    assert!(markup
        .add_connection(PointPair::new(pt(1, 1), pt(9, 1)), regular())
        .is_err());
    assert!(markup
        .add_connection(PointPair::new(pt(1, 2), pt(1, 2)), stop)
        .is_err());

    let id = markup
        .add_connection(PointPair::new(pt(1, 1), pt(1, 5)), stop)
        .unwrap();
    assert_eq!(markup.try_get_line(id).unwrap().line_type(), LineType::Stop);
    assert_eq!(markup.lines().count(), 1);
    assert_eq!(markup.line_counts().get(LineType::Stop), 1);
}

#[test]
fn intersections_are_order_independent_and_fresh() {
    let (_, mut markup) = crossing();
    // y = -6, from east to west
    let horizontal = markup
        .add_connection(PointPair::new(pt(1, 1), pt(3, 5)), regular())
        .unwrap();
    // x = -6, from north to south
    let vertical = markup
        .add_connection(PointPair::new(pt(2, 5), pt(4, 1)), regular())
        .unwrap();

    let ab = markup.intersect(horizontal, vertical);
    let ba = markup.intersect(vertical, horizontal);
    assert_eq!(ab, ba);
    assert!(ab.is_intersect());
    assert_eq!(markup.intersects().len(), 1);

    let before = ab
        .position(markup.try_get_line(horizontal).unwrap().trajectory())
        .unwrap();
    assert!(close(before, Pt2D::new(-6.0, -6.0)));

    // Moving one end of the vertical line moves the crossing
    markup
        .set_point_offset(pt(4, 1), Distance::meters(2.0))
        .unwrap();
    let after_hit = markup.intersect(vertical, horizontal);
    assert!(after_hit.is_intersect());
    let after = after_hit
        .position(markup.try_get_line(horizontal).unwrap().trajectory())
        .unwrap();
    assert!(!after.approx_eq(before, Distance::meters(0.01)));
    assert_eq!(after_hit, markup.intersect(horizontal, vertical));

    // Lines sharing a point don't count as crossing there
    let fan = markup
        .add_connection(PointPair::new(pt(1, 1), pt(2, 5)), regular())
        .unwrap();
    assert!(!markup.intersect(fan, horizontal).is_intersect());
}

#[test]
fn removing_a_line_drops_rules_that_need_it() {
    let (_, mut markup) = crossing();
    let horizontal = markup
        .add_connection(PointPair::new(pt(1, 1), pt(3, 5)), regular())
        .unwrap();
    let vertical = markup
        .add_connection(PointPair::new(pt(2, 5), pt(4, 1)), regular())
        .unwrap();
    markup
        .add_rule(
            horizontal,
            LineRule {
                from: RuleEdge::LineEnd(pt(1, 1)),
                to: RuleEdge::Intersection(vertical),
                style: LineStyle::default_dashed(),
            },
        )
        .unwrap();
    assert_eq!(markup.try_get_line(horizontal).unwrap().rules().len(), 2);
    let edges = markup.rule_edges(horizontal);
    assert_eq!(edges.len(), 3);
    assert_eq!(edges[1], RuleEdge::Intersection(vertical));

    // Rules can only end at the line's own points or at real crossings
    assert!(markup
        .add_rule(
            horizontal,
            LineRule {
                from: RuleEdge::LineEnd(pt(2, 5)),
                to: RuleEdge::LineEnd(pt(1, 1)),
                style: LineStyle::default_dashed(),
            },
        )
        .is_err());

    let dependences = markup.get_line_dependences(vertical);
    assert_eq!(dependences.rules, 1);
    assert!(dependences.exist());
    assert_eq!(dependences.describe(), "1 rule");

    markup.remove_connect(vertical).unwrap();
    assert!(markup.try_get_line(vertical).is_none());
    assert_eq!(markup.try_get_line(horizontal).unwrap().rules().len(), 1);
    assert!(markup.intersects().is_empty());
    assert!(markup.remove_connect(vertical).is_err());
}

#[test]
fn point_dependences() {
    let (_, mut markup) = crossing();
    markup
        .add_connection(PointPair::new(pt(1, 1), pt(3, 5)), regular())
        .unwrap();
    markup
        .add_connection(PointPair::new(pt(1, 1), pt(2, 5)), regular())
        .unwrap();
    let dependences = markup.get_point_dependences(pt(1, 1));
    assert_eq!(dependences.lines, 2);
    assert_eq!(dependences.describe(), "2 lines");
    assert!(!markup.get_point_dependences(pt(4, 3)).exist());
    assert_eq!(markup.get_enter_dependences(SegmentID(1)).lines, 2);
}

#[test]
fn render_batches_cover_lines() {
    let (_, mut markup) = crossing();
    markup
        .add_connection(PointPair::new(pt(1, 1), pt(3, 5)), regular())
        .unwrap();
    assert!(markup.need_recalculate_batches());
    let batches = markup.render_batches();
    assert!(!batches.is_empty());
    for batch in batches {
        assert!(batch.vertices.len() <= MarkupConfig::default().max_batch_vertices);
        assert!(batch
            .indices
            .iter()
            .all(|i| (*i as usize) < batch.vertices.len()));
    }
    assert!(!markup.need_recalculate_batches());
}

#[test]
fn crosswalk_dependences_are_its_lines() {
    let (_, mut markup) = crossing();
    let south = markup
        .add_connection(PointPair::new(pt(1, 1), pt(3, 5)), regular())
        .unwrap();
    let crosswalk = markup
        .add_crosswalk(
            PointPair::new(pt(1, 1), pt(1, 5)),
            CrosswalkStyle::default_zebra(),
        )
        .unwrap();
    markup
        .set_crosswalk_borders(crosswalk, Some(south), None)
        .unwrap();

    // The line itself knows it carries a crosswalk
    assert_eq!(markup.get_line_dependences(crosswalk).crosswalks, 1);

    let dependences = markup.get_crosswalk_dependences(crosswalk);
    assert_eq!(dependences.lines, 1);
    assert_eq!(dependences.crosswalks, 0);
    assert_eq!(dependences.describe(), "1 line");

    // A border isn't something the crosswalk takes with it
    assert_eq!(markup.get_line_dependences(south).crosswalk_borders, 1);
    assert_eq!(markup.get_crosswalk_dependences(crosswalk).crosswalk_borders, 0);
}

#[test]
fn lines_collapsing_to_a_point_are_removed() {
    let (_, mut markup) = crossing();
    let stop = markup
        .add_connection(
            PointPair::new(pt(1, 1), pt(1, 2)),
            ConnectionStyle::Stop(StopLineStyle::default_solid()),
        )
        .unwrap();
    let horizontal = markup
        .add_connection(PointPair::new(pt(1, 1), pt(3, 5)), regular())
        .unwrap();
    markup.render_batches();

    // Slide the first point onto the second
    markup
        .set_point_offset(pt(1, 1), Distance::meters(3.0))
        .unwrap();
    assert!(close(
        markup.get_point(pt(1, 1)).unwrap().position(),
        markup.get_point(pt(1, 2)).unwrap().position()
    ));

    assert!(markup.try_get_line(stop).is_none());
    assert!(!markup.exist_connection(stop));
    assert_eq!(markup.lines().count(), 1);
    // The other line through that point just follows it
    let traj = markup.try_get_line(horizontal).unwrap().trajectory();
    let moved = Pt2D::new(10.0, -3.0);
    assert!(close(traj.start_pt(), moved) || close(traj.end_pt(), moved));
    assert!(markup.need_recalculate_batches());
}
