use geom::{Angle, Distance, Pt2D};
use markup::style::{FillerStyle, LineStyle};
use markup::{
    Alignment, ConnectionStyle, FillerContour, FillerVertex, Markup, MarkupConfig, MarkupManager,
    NodeID, ObjectsMap, PointID, PointPair, SegmentID, StaticNetwork,
};

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

fn west_end(lanes_per_side: usize) -> markup::SegmentEnd {
    StaticNetwork::square_end(
        Pt2D::zero(),
        Angle::degrees(180.0),
        Distance::meters(10.0),
        lanes_per_side,
        100,
    )
}

fn setup() -> (StaticNetwork, Markup) {
    let network = StaticNetwork::crossing(NodeID(1), 4, 2);
    let mut markup = Markup::new(NodeID(1), &network, MarkupConfig::default()).unwrap();
    markup
        .add_connection(PointPair::new(pt(1, 1), pt(3, 5)), regular())
        .unwrap();
    markup
        .add_connection(PointPair::new(pt(2, 5), pt(4, 1)), regular())
        .unwrap();
    (network, markup)
}

#[test]
fn refreshing_without_changes_keeps_everything() {
    let (network, mut markup) = setup();
    let contour =
        FillerContour::replay(&markup, &[at(pt(1, 5)), at(pt(2, 1)), at(pt(2, 5))]).unwrap();
    let filler = markup
        .add_filler(contour, FillerStyle::default_stripe())
        .unwrap();
    let before = markup.to_xml();

    markup.update(&network).unwrap();
    assert_eq!(markup.to_xml(), before);
    assert!(markup.try_get_filler(filler).is_some());
    assert_eq!(markup.intersects().len(), 1);
    assert!(!markup.need_set_order());
}

#[test]
fn new_enters_sort_after_kept_ones_facing_the_same_way() {
    let (mut network, mut markup) = setup();
    // Another segment leaving east, right alongside the first
    let end = StaticNetwork::square_end(
        Pt2D::zero(),
        Angle::degrees(0.0),
        Distance::meters(10.0),
        1,
        200,
    );
    network.attach(NodeID(1), SegmentID(5), end).unwrap();
    markup.update(&network).unwrap();

    let ids: Vec<SegmentID> = markup.enters().iter().map(|e| e.id).collect();
    assert_eq!(
        ids,
        vec![
            SegmentID(1),
            SegmentID(5),
            SegmentID(2),
            SegmentID(3),
            SegmentID(4)
        ]
    );
    // Nothing built on the kept enters was lost
    assert_eq!(markup.lines().count(), 2);
}

#[test]
fn segment_moves_with_the_node() {
    let (mut network, mut markup) = setup();
    let line = PointPair::new(pt(1, 1), pt(3, 5));
    let before = markup.try_get_line(line).unwrap().trajectory().length();

    // Widen the node by pushing the west segment further out
    let mut end = west_end(2);
    end.position = Pt2D::zero().project_away(Distance::meters(20.0), Angle::degrees(180.0));
    network.attach(NodeID(1), SegmentID(3), end).unwrap();
    markup.update(&network).unwrap();

    let after = markup.try_get_line(line).unwrap().trajectory().length();
    assert!(after > before + Distance::meters(9.0));
    assert!(markup.radius() >= Distance::meters(20.0));
}

#[test]
fn replacing_a_segment_with_the_same_lanes() {
    let (mut network, mut markup) = setup();
    network.detach(NodeID(1), SegmentID(3));
    network.attach(NodeID(1), SegmentID(7), west_end(2)).unwrap();
    markup.update(&network).unwrap();

    assert!(!markup.contains_enter(SegmentID(3)));
    assert!(markup.contains_enter(SegmentID(7)));
    assert!(markup.exist_connection(PointPair::new(pt(1, 1), pt(7, 5))));
    assert!(!markup.exist_connection(PointPair::new(pt(1, 1), pt(3, 5))));
    assert_eq!(markup.lines().count(), 2);
    assert!(!markup.need_set_order());
    assert!(markup.backup().is_none());
}

#[test]
fn replacing_a_segment_with_fewer_lanes() {
    let (mut network, mut markup) = setup();
    network.detach(NodeID(1), SegmentID(3));
    network.attach(NodeID(1), SegmentID(7), west_end(1)).unwrap();
    markup.update(&network).unwrap();

    // The line to the old segment is gone for now, but kept aside
    assert!(markup.need_set_order());
    assert!(markup.backup().is_some());
    assert_eq!(markup.try_get_enter(SegmentID(7)).unwrap().point_count(), 3);
    assert_eq!(markup.lines().count(), 1);

    // Say where the old outer point went
    let mut map = ObjectsMap::new();
    map.add_point(pt(3, 5), pt(7, 3));
    markup.apply_backup(&map).unwrap();
    assert!(markup.exist_connection(PointPair::new(pt(1, 1), pt(7, 3))));
    assert!(markup.exist_connection(PointPair::new(pt(2, 5), pt(4, 1))));
    assert!(!markup.need_set_order());
    assert!(markup.backup().is_none());
    assert!(markup.apply_backup(&map).is_err());
}

#[test]
fn dropping_a_backup() {
    let (mut network, mut markup) = setup();
    network.detach(NodeID(1), SegmentID(3));
    network.attach(NodeID(1), SegmentID(7), west_end(1)).unwrap();
    markup.update(&network).unwrap();
    assert!(markup.need_set_order());

    markup.clear_backup();
    assert!(!markup.need_set_order());
    assert!(markup.backup().is_none());
    assert_eq!(markup.lines().count(), 1);
}

#[test]
fn removing_a_segment_drops_what_touched_it() {
    let (mut network, mut markup) = setup();
    network.detach(NodeID(1), SegmentID(4));
    markup.update(&network).unwrap();

    assert_eq!(markup.enters().len(), 3);
    assert!(!markup.exist_connection(PointPair::new(pt(2, 5), pt(4, 1))));
    assert!(markup.exist_connection(PointPair::new(pt(1, 1), pt(3, 5))));
    assert!(markup.intersects().is_empty());
}

#[test]
fn manager_follows_the_network() {
    let (mut network, _) = setup();
    let mut manager = MarkupManager::new(MarkupConfig::default());
    manager
        .get(NodeID(1), &network)
        .unwrap()
        .add_connection(PointPair::new(pt(1, 1), pt(3, 5)), regular())
        .unwrap();

    network.detach(NodeID(1), SegmentID(3));
    manager.on_node_changed(NodeID(1), &network).unwrap();
    assert_eq!(manager.try_get(NodeID(1)).unwrap().lines().count(), 0);

    // Changes to nodes without markup are ignored
    manager.on_node_changed(NodeID(5), &network).unwrap();
    assert!(!manager.contains(NodeID(5)));

    network.remove_node(NodeID(1));
    manager.on_node_changed(NodeID(1), &network).unwrap();
    assert!(!manager.contains(NodeID(1)));
}
