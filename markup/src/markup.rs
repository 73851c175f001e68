use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use xmltree::Element;

use abstutil::{plain_list_names, prettyprint_usize, wraparound_get, Counter};
use geom::{Bezier, Distance, Pt2D, Trajectory};

use crate::contour::{ContourLine, FillerContour, FillerVertex};
use crate::objects::{
    line_trajectory, Alignment, Crosswalk, Enter, Filler, FillerID, LineID, LineIntersection,
    LineKind, LinePair, LineRule, LineType, MarkupLine, MarkupPoint, PointID, PointPair, RuleEdge,
};
use crate::perma::ObjectsMap;
use crate::render::{crosswalk_dashes, filler_render, line_dashes, Dash, Mesh, RenderBatch};
use crate::style::{CrosswalkStyle, FillerStyle, LineStyle, StopLineStyle};
use crate::{HostNetwork, MarkupConfig, NodeID, SegmentID};

/// How a new line between two points is styled. The kind of line follows from the style.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConnectionStyle {
    Regular(LineStyle),
    Stop(StopLineStyle),
}

/// What else would disappear along with something.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dependences {
    pub lines: usize,
    pub rules: usize,
    pub fillers: usize,
    pub crosswalks: usize,
    pub crosswalk_borders: usize,
}

impl Dependences {
    pub fn total(&self) -> usize {
        self.lines + self.rules + self.fillers + self.crosswalks + self.crosswalk_borders
    }

    pub fn exist(&self) -> bool {
        self.total() > 0
    }

    /// Like "2 lines and 1 filler", for asking before deleting.
    pub fn describe(&self) -> String {
        let mut names = BTreeSet::new();
        for (count, name) in [
            (self.lines, "line"),
            (self.rules, "rule"),
            (self.fillers, "filler"),
            (self.crosswalks, "crosswalk"),
            (self.crosswalk_borders, "crosswalk border"),
        ] {
            if count == 1 {
                names.insert(format!("1 {}", name));
            } else if count > 1 {
                names.insert(format!("{} {}s", prettyprint_usize(count), name));
            }
        }
        plain_list_names(names)
    }
}

/// What the markup looked like before an enter was replaced by one with a different number of
/// points. Until the user says how the old points map onto the new ones, this is kept around.
#[derive(Clone, Debug)]
pub struct MarkupBackup {
    pub xml: Element,
    pub map: ObjectsMap,
}

/// All the markup on one node: the points on each road end, the lines between them, where those
/// lines cross, and the fillers and crosswalks built on top.
pub struct Markup {
    pub id: NodeID,
    config: MarkupConfig,

    position: Pt2D,
    height: Distance,
    radius: Distance,
    /// Sorted counter-clockwise by direction
    enters: Vec<Enter>,
    /// The outline of the node: along each cut edge, then curving over to the next one
    contour: Vec<Trajectory>,

    lines: BTreeMap<LineID, MarkupLine>,
    /// Only pairs of stored lines are cached
    intersections: RefCell<BTreeMap<LinePair, LineIntersection>>,
    fillers: BTreeMap<FillerID, Filler>,
    next_filler: usize,
    crosswalks: BTreeMap<LineID, Crosswalk>,

    line_dashes: BTreeMap<LineID, Vec<Dash>>,
    batches: Vec<RenderBatch>,
    need_recalculate_batches: bool,

    need_set_order: bool,
    backup: Option<MarkupBackup>,
}

impl Markup {
    pub fn new(id: NodeID, host: &dyn HostNetwork, config: MarkupConfig) -> Result<Markup> {
        let mut markup = Markup {
            id,
            config,
            position: Pt2D::zero(),
            height: Distance::ZERO,
            radius: Distance::ZERO,
            enters: Vec::new(),
            contour: Vec::new(),
            lines: BTreeMap::new(),
            intersections: RefCell::new(BTreeMap::new()),
            fillers: BTreeMap::new(),
            next_filler: 0,
            crosswalks: BTreeMap::new(),
            line_dashes: BTreeMap::new(),
            batches: Vec::new(),
            need_recalculate_batches: true,
            need_set_order: false,
            backup: None,
        };
        markup.update(host)?;
        Ok(markup)
    }

    pub fn config(&self) -> &MarkupConfig {
        &self.config
    }

    pub fn position(&self) -> Pt2D {
        self.position
    }

    pub fn height(&self) -> Distance {
        self.height
    }

    /// How far the node's outline reaches from its center.
    pub fn radius(&self) -> Distance {
        self.radius
    }

    /// Nothing drawn and no point adjusted.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
            && self.fillers.is_empty()
            && self.crosswalks.is_empty()
            && self.enters.iter().all(|e| {
                e.points()
                    .iter()
                    .all(|p| p.offset() == Distance::ZERO && !p.is_split())
            })
    }

    pub fn contour(&self) -> &Vec<Trajectory> {
        &self.contour
    }

    // Topology

    /// Refreshes everything from the host, after the node or any of its segments changed.
    pub fn update(&mut self, host: &dyn HostNetwork) -> Result<()> {
        self.update_enters(host)?;
        self.update_node_contour();
        self.update_radius();
        self.refresh_entities();
        Ok(())
    }

    fn update_enters(&mut self, host: &dyn HostNetwork) -> Result<()> {
        let node = host
            .node(self.id)
            .ok_or_else(|| anyhow!("{} doesn't exist", self.id))?;
        self.position = node.position;
        self.height = node.height;

        let existing: Vec<SegmentID> = self.enters.iter().map(|e| e.id).collect();
        let deleted: Vec<SegmentID> = existing
            .iter()
            .filter(|id| !node.segments.contains(id))
            .copied()
            .collect();
        let added: Vec<SegmentID> = node
            .segments
            .iter()
            .filter(|id| !existing.contains(id))
            .copied()
            .collect();

        let mut added_enters = Vec::new();
        for id in &added {
            added_enters.push(Enter::new(self.id, *id, host, &self.config)?);
        }
        for enter in &mut self.enters {
            if !deleted.contains(&enter.id) {
                enter.update(self.id, host, &self.config)?;
            }
        }
        // Snapshot while the old enter is still here, in case this is a replacement
        let substitution = if deleted.len() == 1 && added.len() == 1 {
            Some((deleted[0], added[0], self.to_xml()))
        } else {
            None
        };

        // Kept enters go first, so they stay ahead of new ones pointing the same way
        let mut new_enters = Vec::new();
        let mut old_point_counts = BTreeMap::new();
        for enter in std::mem::take(&mut self.enters) {
            if deleted.contains(&enter.id) {
                old_point_counts.insert(enter.id, enter.point_count());
            } else {
                new_enters.push(enter);
            }
        }
        new_enters.extend(added_enters);
        new_enters.sort_by(|a, b| {
            a.absolute_angle()
                .partial_cmp(&b.absolute_angle())
                .unwrap_or(Ordering::Equal)
        });
        self.enters = new_enters;

        if !deleted.is_empty() || !added.is_empty() {
            info!(
                "{}: {} enters removed, {} added",
                self.id,
                deleted.len(),
                added.len()
            );
        }
        if let Some((old, new, snapshot)) = substitution {
            let before = old_point_counts.get(&old).copied().unwrap_or(0);
            self.update_backup(old, new, before, snapshot)?;
        }
        Ok(())
    }

    /// One segment was swapped for another. If the point counts match, the markup moves over.
    /// Otherwise it's kept aside until `apply_backup` says how the points match up.
    fn update_backup(
        &mut self,
        old: SegmentID,
        new: SegmentID,
        before: usize,
        snapshot: Element,
    ) -> Result<()> {
        let after = self
            .try_get_enter(new)
            .map(|e| e.point_count())
            .unwrap_or(0);

        if before != after && !self.need_set_order {
            warn!(
                "{}: {} replaced {} but has {} points instead of {}. Markup along it is dropped \
                 until the points are matched up again.",
                self.id, new, old, after, before
            );
            self.need_set_order = true;
            self.backup = Some(MarkupBackup {
                xml: snapshot.clone(),
                map: ObjectsMap::new(),
            });
        }
        if self.need_set_order {
            if let Some(ref mut backup) = self.backup {
                backup.map.chain_segment(old, new);
            }
        }
        if before == after {
            let mut map = ObjectsMap::new();
            map.add_segment(old, new);
            self.clear();
            self.load_xml_body(&snapshot, &map)?;
            info!("{}: moved markup from {} onto {}", self.id, old, new);
        }
        Ok(())
    }

    fn update_node_contour(&mut self) {
        let mut contour = Vec::new();
        for idx in 0..self.enters.len() {
            let enter = &self.enters[idx];
            let next = wraparound_get(&self.enters, idx as isize + 1);
            contour.extend(Trajectory::straight(enter.left_side(), enter.right_side()));
            if enter.id != next.id && !enter.right_side().approx_eq(next.left_side(), geom::EPSILON_DIST)
            {
                contour.push(Trajectory::Curve(Bezier::smooth_connector(
                    enter.right_side(),
                    enter.normal_dir().opposite(),
                    next.left_side(),
                    next.normal_dir().opposite(),
                )));
            }
        }
        self.contour = contour;
    }

    fn update_radius(&mut self) {
        let mut radius = Distance::ZERO;
        for traj in &self.contour {
            for pt in traj.sample_points() {
                radius = radius.max(self.position.dist_to(pt));
            }
        }
        self.radius = radius;
    }

    fn refresh_entities(&mut self) {
        self.update_lines();
        self.update_fillers();
        self.update_crosswalks();
        self.recalculate();
    }

    fn update_lines(&mut self) {
        let ids: Vec<LineID> = self.lines.keys().copied().collect();
        for id in ids {
            if self.get_point(id.first()).is_none() || self.get_point(id.second()).is_none() {
                info!("{}: {} lost one of its points", self.id, id);
                self.remove_line(id);
            } else if !self.update_line_trajectory(id) {
                warn!("{}: {} collapsed to nothing", self.id, id);
                self.remove_line(id);
            }
        }
    }

    fn update_fillers(&mut self) {
        let ids: Vec<FillerID> = self.fillers.keys().copied().collect();
        for id in ids {
            let valid = self
                .fillers
                .get(&id)
                .map(|f| f.contour.is_valid(self))
                .unwrap_or(false);
            if valid {
                self.update_filler(id, false);
            } else {
                self.repair_filler(id, None);
            }
        }
    }

    fn update_crosswalks(&mut self) {
        let lines = &self.lines;
        self.crosswalks.retain(|id, _| lines.contains_key(id));
        for crosswalk in self.crosswalks.values_mut() {
            for border in [crosswalk.left_border(), crosswalk.right_border()]
                .into_iter()
                .flatten()
            {
                if !lines.contains_key(&border) {
                    crosswalk.remove_border(border);
                }
            }
            crosswalk.dashes = None;
        }
    }

    /// Throws away every cached intersection and all render data.
    pub fn recalculate(&mut self) {
        self.intersections.borrow_mut().clear();
        self.line_dashes.clear();
        for crosswalk in self.crosswalks.values_mut() {
            crosswalk.dashes = None;
        }
        for filler in self.fillers.values_mut() {
            filler.render = None;
        }
        self.need_recalculate_batches = true;
    }

    /// Removes every line, filler and crosswalk, and resets all points.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.intersections.borrow_mut().clear();
        self.fillers.clear();
        self.next_filler = 0;
        self.crosswalks.clear();
        self.line_dashes.clear();
        for enter in &mut self.enters {
            if let Err(err) = enter.reset_points() {
                warn!("{}: can't reset the points of {}: {}", self.id, enter.id, err);
            }
        }
        self.need_recalculate_batches = true;
    }

    /// Undoes every point adjustment, keeping lines and fillers.
    pub fn reset_offsets(&mut self) -> Result<()> {
        for enter in &mut self.enters {
            enter.reset_points()?;
        }
        let points: Vec<PointID> = self
            .enters
            .iter()
            .flat_map(|e| e.points().iter().map(|p| p.id))
            .collect();
        for point in points {
            self.update_point(point, false);
        }
        self.need_recalculate_batches = true;
        Ok(())
    }

    // Backups

    pub fn need_set_order(&self) -> bool {
        self.need_set_order
    }

    pub fn backup(&self) -> Option<&MarkupBackup> {
        self.backup.as_ref()
    }

    pub fn clear_backup(&mut self) {
        self.backup = None;
        self.need_set_order = false;
    }

    /// Restores the markup from before a lossy enter replacement. `map` says where old points
    /// went.
    pub fn apply_backup(&mut self, map: &ObjectsMap) -> Result<()> {
        let backup = self
            .backup
            .take()
            .ok_or_else(|| anyhow!("{} has nothing to restore", self.id))?;
        let mut full = backup.map.clone();
        full.extend(map);
        self.clear();
        if let Err(err) = self.load_xml_body(&backup.xml, &full) {
            self.backup = Some(backup);
            return Err(err);
        }
        self.need_set_order = false;
        self.refresh_entities();
        Ok(())
    }

    // Enters and points

    pub fn enters(&self) -> &Vec<Enter> {
        &self.enters
    }

    pub fn try_get_enter(&self, id: SegmentID) -> Option<&Enter> {
        self.enters.iter().find(|e| e.id == id)
    }

    pub fn contains_enter(&self, id: SegmentID) -> bool {
        self.try_get_enter(id).is_some()
    }

    /// The neighboring enter, going counter-clockwise.
    pub fn next_enter(&self, id: SegmentID) -> Option<&Enter> {
        let idx = self.enters.iter().position(|e| e.id == id)?;
        Some(wraparound_get(&self.enters, idx as isize + 1))
    }

    pub fn prev_enter(&self, id: SegmentID) -> Option<&Enter> {
        let idx = self.enters.iter().position(|e| e.id == id)?;
        Some(wraparound_get(&self.enters, idx as isize - 1))
    }

    pub fn get_point(&self, id: PointID) -> Option<&MarkupPoint> {
        self.try_get_enter(id.enter)?.get_point(id.num)
    }

    fn get_point_mut(&mut self, id: PointID) -> Option<&mut MarkupPoint> {
        self.enters
            .iter_mut()
            .find(|e| e.id == id.enter)?
            .get_point_mut(id.num)
    }

    pub fn set_point_offset(&mut self, id: PointID, offset: Distance) -> Result<()> {
        self.get_point_mut(id)
            .ok_or_else(|| anyhow!("{} doesn't exist", id))?
            .set_offset(offset)?;
        self.update_point(id, true);
        Ok(())
    }

    pub fn set_point_split(&mut self, id: PointID, split: bool) -> Result<()> {
        let split_offset = self.config.default_split_offset;
        let point = self
            .get_point_mut(id)
            .ok_or_else(|| anyhow!("{} doesn't exist", id))?;
        point.set_split(split, split_offset);
        self.update_point(id, true);
        Ok(())
    }

    pub(crate) fn load_point_split(&mut self, id: PointID, split: bool, split_offset: Distance) {
        if let Some(point) = self.get_point_mut(id) {
            point.set_split(split, split_offset);
            self.update_point(id, true);
        }
    }

    /// Propagates a change to a point into everything built on it.
    pub fn update_point(&mut self, id: PointID, recalculate: bool) {
        let lines: Vec<LineID> = self
            .lines
            .keys()
            .filter(|l| l.contains(id))
            .copied()
            .collect();
        for line in lines {
            self.update_line(line, false);
        }
        let fillers: Vec<FillerID> = self
            .fillers
            .values()
            .filter(|f| f.contains_point(id))
            .map(|f| f.id)
            .collect();
        for filler in fillers {
            self.update_filler(filler, false);
        }
        for crosswalk in self.crosswalks.values_mut() {
            if crosswalk.contains_point(id) {
                crosswalk.dashes = None;
            }
        }
        if recalculate {
            self.need_recalculate_batches = true;
        }
    }

    // Lines

    pub fn lines(&self) -> impl Iterator<Item = &MarkupLine> {
        self.lines.values()
    }

    pub fn try_get_line(&self, id: LineID) -> Option<&MarkupLine> {
        self.lines.get(&id)
    }

    pub fn exist_connection(&self, pair: PointPair) -> bool {
        self.lines.contains_key(&pair)
    }

    pub fn point_lines(&self, point: PointID) -> Vec<&MarkupLine> {
        self.lines
            .values()
            .filter(|l| l.id.contains(point))
            .collect()
    }

    pub fn line_counts(&self) -> Counter<LineType> {
        let mut counts = Counter::new();
        for line in self.lines.values() {
            counts.inc(line.line_type());
        }
        counts
    }

    /// Connects two points. Connecting points that are already connected returns the existing
    /// line unchanged.
    pub fn add_connection(&mut self, pair: PointPair, style: ConnectionStyle) -> Result<LineID> {
        if self.lines.contains_key(&pair) {
            return Ok(pair);
        }
        if pair.first() == pair.second() {
            bail!("can't connect {} to itself", pair.first());
        }
        let kind = match style {
            ConnectionStyle::Regular(style) => {
                if pair.is_same_enter() {
                    bail!("{} is along one enter; regular lines cross the node", pair);
                }
                LineKind::Regular {
                    rules: vec![LineRule::whole(pair, style)],
                }
            }
            ConnectionStyle::Stop(style) => {
                if !pair.is_same_enter() {
                    bail!("{} crosses the node; stop lines stay on one enter", pair);
                }
                LineKind::Stop { style }
            }
        };
        self.insert_line(pair, Alignment::Centre, kind)
    }

    pub(crate) fn insert_line(
        &mut self,
        id: LineID,
        alignment: Alignment,
        kind: LineKind,
    ) -> Result<LineID> {
        let trajectory = self
            .synthesize_trajectory(id, alignment)
            .ok_or_else(|| anyhow!("{} is missing a point or too short", id))?;
        self.lines
            .insert(id, MarkupLine::new(id, alignment, kind, trajectory));
        self.update_line(id, true);
        Ok(id)
    }

    /// Attaches a line to the other halves of split points.
    pub fn set_line_alignment(&mut self, id: LineID, alignment: Alignment) -> Result<()> {
        let line = self
            .lines
            .get(&id)
            .ok_or_else(|| anyhow!("{} doesn't exist", id))?;
        let trajectory = self
            .synthesize_trajectory(id, alignment)
            .ok_or_else(|| anyhow!("{} would collapse with {:?}", id, alignment))?;
        let kind = line.kind.clone();
        self.lines
            .insert(id, MarkupLine::new(id, alignment, kind, trajectory));
        self.update_line(id, true);
        Ok(())
    }

    /// Adds a styled span to a regular line. Both edges must be ends of the line, or stored
    /// lines crossing it.
    pub fn add_rule(&mut self, id: LineID, rule: LineRule) -> Result<()> {
        let line = self
            .lines
            .get(&id)
            .ok_or_else(|| anyhow!("{} doesn't exist", id))?;
        for edge in [rule.from, rule.to] {
            if self.rule_edge_t(line, edge).is_none() {
                bail!("{:?} isn't on {}", edge, id);
            }
        }
        let added = self
            .lines
            .get_mut(&id)
            .map(|l| l.add_rule(rule))
            .unwrap_or(false);
        if !added {
            bail!("only regular lines have rules, not {}", id);
        }
        self.line_dashes.remove(&id);
        self.need_recalculate_batches = true;
        Ok(())
    }

    pub fn remove_rule(&mut self, id: LineID, idx: usize) -> Result<()> {
        let line = self
            .lines
            .get_mut(&id)
            .ok_or_else(|| anyhow!("{} doesn't exist", id))?;
        match line.kind {
            LineKind::Regular { ref mut rules } if idx < rules.len() => {
                rules.remove(idx);
            }
            _ => bail!("{} has no rule {}", id, idx),
        }
        self.line_dashes.remove(&id);
        self.need_recalculate_batches = true;
        Ok(())
    }

    /// Where a rule edge falls along a line.
    pub fn rule_edge_t(&self, line: &MarkupLine, edge: RuleEdge) -> Option<f64> {
        match edge {
            RuleEdge::LineEnd(point) => {
                if point == line.start() {
                    Some(0.0)
                } else if point == line.end() {
                    Some(1.0)
                } else {
                    None
                }
            }
            RuleEdge::Intersection(other) => {
                if !self.lines.contains_key(&other) {
                    return None;
                }
                self.intersect(line.id, other).t_for(line.id)
            }
        }
    }

    /// Everywhere a rule on this line could start or end, in order along the line.
    pub fn rule_edges(&self, id: LineID) -> Vec<RuleEdge> {
        let line = match self.lines.get(&id) {
            Some(line) if line.is_regular() => line,
            _ => return Vec::new(),
        };
        let mut edges: Vec<(f64, RuleEdge)> = vec![
            (0.0, RuleEdge::LineEnd(line.start())),
            (1.0, RuleEdge::LineEnd(line.end())),
        ];
        for hit in self.get_intersects(id) {
            if let (Some(t), Some(other)) = (hit.t_for(id), hit.pair.other(id)) {
                edges.push((t, RuleEdge::Intersection(other)));
            }
        }
        edges.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        edges.into_iter().map(|(_, edge)| edge).collect()
    }

    /// Removes a line and everything that depended on it.
    pub fn remove_connect(&mut self, id: LineID) -> Result<()> {
        if !self.lines.contains_key(&id) {
            bail!("{} doesn't exist", id);
        }
        self.remove_line(id);
        self.need_recalculate_batches = true;
        Ok(())
    }

    fn remove_line(&mut self, id: LineID) {
        let removed = match self.lines.remove(&id) {
            Some(line) => line,
            None => return,
        };
        for line in self.lines.values_mut() {
            if line.remove_rules_with(id) > 0 {
                self.line_dashes.remove(&line.id);
            }
        }
        self.intersections
            .borrow_mut()
            .retain(|pair, _| !pair.contains(id));
        self.line_dashes.remove(&id);

        let fillers: Vec<FillerID> = self
            .fillers
            .values()
            .filter(|f| f.contains_line(id))
            .map(|f| f.id)
            .collect();
        for filler in fillers {
            self.repair_filler(filler, Some(id));
        }

        if removed.line_type() == LineType::Crosswalk {
            self.crosswalks.remove(&id);
        }
        for crosswalk in self.crosswalks.values_mut() {
            if crosswalk.is_border(id) {
                crosswalk.remove_border(id);
            }
        }
    }

    /// Recomputes a line's trajectory and forgets everything derived from the old one.
    /// A line whose points now coincide is removed, along with what depended on it.
    pub fn update_line(&mut self, id: LineID, recalculate: bool) {
        if !self.lines.contains_key(&id) {
            return;
        }
        if !self.update_line_trajectory(id) {
            warn!("{}: {} can't be drawn anymore, removing it", self.id, id);
            self.remove_line(id);
            self.need_recalculate_batches = true;
            return;
        }
        self.line_dashes.remove(&id);
        let stale: Vec<LinePair> = self
            .intersections
            .borrow()
            .keys()
            .filter(|pair| pair.contains(id))
            .copied()
            .collect();
        for pair in stale {
            self.intersections.borrow_mut().remove(&pair);
            if let Some(other) = pair.other(id) {
                self.line_dashes.remove(&other);
            }
        }

        let fillers: Vec<FillerID> = self
            .fillers
            .values()
            .filter(|f| f.contains_line(id))
            .map(|f| f.id)
            .collect();
        for filler in fillers {
            self.update_filler(filler, false);
        }
        let crosswalks: Vec<LineID> = self
            .crosswalks
            .values()
            .filter(|c| c.line == id || c.is_border(id))
            .map(|c| c.line)
            .collect();
        for crosswalk in crosswalks {
            self.update_crosswalk(crosswalk, false);
        }
        if recalculate {
            self.need_recalculate_batches = true;
        }
    }

    /// Forgets a crosswalk's dashes, so they're rebuilt from its current lines.
    pub fn update_crosswalk(&mut self, line: LineID, recalculate: bool) {
        if let Some(crosswalk) = self.crosswalks.get_mut(&line) {
            crosswalk.dashes = None;
        }
        if recalculate {
            self.need_recalculate_batches = true;
        }
    }

    fn update_line_trajectory(&mut self, id: LineID) -> bool {
        let trajectory = match self.lines.get(&id) {
            Some(line) => self.synthesize_trajectory(id, line.alignment()),
            None => return false,
        };
        match (trajectory, self.lines.get_mut(&id)) {
            (Some(trajectory), Some(line)) => {
                line.set_trajectory(trajectory);
                true
            }
            _ => false,
        }
    }

    fn synthesize_trajectory(&self, id: LineID, alignment: Alignment) -> Option<Trajectory> {
        line_trajectory(
            self.get_point(id.first())?,
            self.get_point(id.second())?,
            alignment,
        )
    }

    /// The trajectory of a stored line, or of the line that would connect the two points.
    pub fn line_trajectory(&self, id: LineID) -> Option<Trajectory> {
        match self.lines.get(&id) {
            Some(line) => Some(*line.trajectory()),
            None => self.synthesize_trajectory(id, Alignment::Centre),
        }
    }

    pub fn contour_line(&self, id: LineID) -> ContourLine {
        match self.lines.get(&id) {
            Some(line) => ContourLine::of(line),
            None => ContourLine {
                id,
                alignment: Alignment::Centre,
            },
        }
    }

    /// Stored lines win over whatever an outline remembers about them.
    pub fn resolve_contour_line(&self, line: ContourLine) -> ContourLine {
        match self.lines.get(&line.id) {
            Some(stored) => ContourLine::of(stored),
            None => line,
        }
    }

    pub fn contour_line_trajectory(&self, line: ContourLine) -> Option<Trajectory> {
        match self.lines.get(&line.id) {
            Some(stored) => Some(*stored.trajectory()),
            None => self.synthesize_trajectory(line.id, line.alignment),
        }
    }

    // Intersections

    /// Where two lines cross. Results for stored lines are cached until either line changes.
    pub fn intersect(&self, a: LineID, b: LineID) -> LineIntersection {
        let pair = LinePair::new(a, b);
        let cacheable = self.lines.contains_key(&a) && self.lines.contains_key(&b);
        if cacheable {
            if let Some(hit) = self.intersections.borrow().get(&pair) {
                return *hit;
            }
        }
        let hit = match (
            self.line_trajectory(pair.first()),
            self.line_trajectory(pair.second()),
        ) {
            (Some(first), Some(second)) if a != b => {
                LineIntersection::calculate(pair, &first, &second)
            }
            _ => LineIntersection::not_intersect(pair),
        };
        if cacheable {
            self.intersections.borrow_mut().insert(pair, hit);
        }
        hit
    }

    /// The intersection of a line with every other stored line.
    pub fn get_intersects(&self, id: LineID) -> Vec<LineIntersection> {
        self.lines
            .keys()
            .filter(|other| **other != id)
            .map(|other| self.intersect(id, *other))
            .collect()
    }

    /// Only what's already cached.
    pub fn get_exist_intersects(&self, id: LineID, only_crossing: bool) -> Vec<LineIntersection> {
        self.intersections
            .borrow()
            .values()
            .filter(|hit| hit.pair.contains(id) && (!only_crossing || hit.is_intersect()))
            .copied()
            .collect()
    }

    /// Every crossing between two stored regular lines.
    pub fn intersects(&self) -> Vec<LineIntersection> {
        let regular: Vec<LineID> = self
            .lines
            .values()
            .filter(|l| l.is_regular())
            .map(|l| l.id)
            .collect();
        let mut result = Vec::new();
        for (idx, a) in regular.iter().enumerate() {
            for b in &regular[idx + 1..] {
                let hit = self.intersect(*a, *b);
                if hit.is_intersect() {
                    result.push(hit);
                }
            }
        }
        result
    }

    // Fillers

    pub fn fillers(&self) -> impl Iterator<Item = &Filler> {
        self.fillers.values()
    }

    pub fn try_get_filler(&self, id: FillerID) -> Option<&Filler> {
        self.fillers.get(&id)
    }

    pub fn add_filler(&mut self, contour: FillerContour, style: FillerStyle) -> Result<FillerID> {
        self.insert_filler(None, contour, style)
    }

    /// Keeps a saved ID when it's still free, so fillers aren't renumbered by saving and loading.
    pub(crate) fn insert_filler(
        &mut self,
        saved: Option<FillerID>,
        contour: FillerContour,
        style: FillerStyle,
    ) -> Result<FillerID> {
        if !contour.is_complete() {
            bail!("the filler's outline isn't closed");
        }
        if !contour.is_valid(self) {
            bail!("the filler's outline refers to missing points or lines");
        }
        let id = match saved {
            Some(id) if !self.fillers.contains_key(&id) => id,
            _ => FillerID(self.next_filler),
        };
        self.next_filler = self.next_filler.max(id.0 + 1);
        self.fillers.insert(id, Filler::new(id, contour, style));
        self.need_recalculate_batches = true;
        Ok(id)
    }

    pub fn set_filler_style(&mut self, id: FillerID, style: FillerStyle) -> Result<()> {
        let filler = self
            .fillers
            .get_mut(&id)
            .ok_or_else(|| anyhow!("{} doesn't exist", id))?;
        filler.style = style;
        filler.render = None;
        self.need_recalculate_batches = true;
        Ok(())
    }

    pub fn remove_filler(&mut self, id: FillerID) -> Result<()> {
        if self.fillers.remove(&id).is_none() {
            bail!("{} doesn't exist", id);
        }
        self.need_recalculate_batches = true;
        Ok(())
    }

    pub fn update_filler(&mut self, id: FillerID, recalculate: bool) {
        let mut contour = match self.fillers.get(&id) {
            Some(filler) => filler.contour.clone(),
            None => return,
        };
        contour.update(self);
        if let Some(filler) = self.fillers.get_mut(&id) {
            filler.contour = contour;
            filler.render = None;
        }
        if recalculate {
            self.need_recalculate_batches = true;
        }
    }

    /// Rebuilds a filler's outline from its points after something it used disappeared, dropping
    /// crossings of `removed_line`. Fillers that can't close anymore are removed.
    fn repair_filler(&mut self, id: FillerID, removed_line: Option<LineID>) {
        let mut vertices: Vec<FillerVertex> = Vec::new();
        match self.fillers.get(&id) {
            Some(filler) => {
                for vertex in filler.contour.raw_vertices() {
                    if let FillerVertex::Intersection(pair) = vertex {
                        let gone = removed_line.map(|l| pair.contains(l)).unwrap_or(false)
                            || !self.lines.contains_key(&pair.first())
                            || !self.lines.contains_key(&pair.second());
                        if gone {
                            continue;
                        }
                    }
                    let processed = vertex.processed(self);
                    if !vertices.contains(&processed) {
                        vertices.push(processed);
                    }
                }
            }
            None => return,
        }

        match FillerContour::replay(self, &vertices) {
            Ok(contour) => {
                if let Some(filler) = self.fillers.get_mut(&id) {
                    filler.contour = contour;
                    filler.render = None;
                }
                debug!("{}: rebuilt the outline of {}", self.id, id);
            }
            Err(err) => {
                warn!("{}: removing {}: {}", self.id, id, err);
                self.fillers.remove(&id);
            }
        }
        self.need_recalculate_batches = true;
    }

    pub fn get_filler_dependences(&self, _id: FillerID) -> Dependences {
        Dependences::default()
    }

    // Crosswalks

    pub fn crosswalks(&self) -> impl Iterator<Item = &Crosswalk> {
        self.crosswalks.values()
    }

    pub fn try_get_crosswalk(&self, line: LineID) -> Option<&Crosswalk> {
        self.crosswalks.get(&line)
    }

    pub fn add_crosswalk(&mut self, pair: PointPair, style: CrosswalkStyle) -> Result<LineID> {
        if self.crosswalks.contains_key(&pair) {
            return Ok(pair);
        }
        if !pair.is_same_enter() {
            bail!("{} crosses the node; crosswalks stay on one enter", pair);
        }
        if self.lines.contains_key(&pair) {
            bail!("{} is already another kind of line", pair);
        }
        self.insert_line(pair, Alignment::Centre, LineKind::Crosswalk)?;
        self.crosswalks.insert(pair, Crosswalk::new(pair, style));
        Ok(pair)
    }

    pub fn set_crosswalk_style(&mut self, line: LineID, style: CrosswalkStyle) -> Result<()> {
        let crosswalk = self
            .crosswalks
            .get_mut(&line)
            .ok_or_else(|| anyhow!("no crosswalk along {}", line))?;
        crosswalk.style = style;
        crosswalk.dashes = None;
        self.need_recalculate_batches = true;
        Ok(())
    }

    /// Clips the crosswalk where two regular lines cross it.
    pub fn set_crosswalk_borders(
        &mut self,
        line: LineID,
        left: Option<LineID>,
        right: Option<LineID>,
    ) -> Result<()> {
        for border in [left, right].into_iter().flatten() {
            if !self
                .lines
                .get(&border)
                .map(|l| l.is_regular())
                .unwrap_or(false)
            {
                bail!("{} isn't a regular line", border);
            }
        }
        let crosswalk = self
            .crosswalks
            .get_mut(&line)
            .ok_or_else(|| anyhow!("no crosswalk along {}", line))?;
        crosswalk.set_borders(left, right);
        self.need_recalculate_batches = true;
        Ok(())
    }

    pub fn remove_crosswalk(&mut self, line: LineID) -> Result<()> {
        if !self.crosswalks.contains_key(&line) {
            bail!("no crosswalk along {}", line);
        }
        self.remove_connect(line)
    }

    /// Deleting a crosswalk deletes its line, and everything depending on that.
    pub fn get_crosswalk_dependences(&self, line: LineID) -> Dependences {
        let mut dependences = self.get_line_dependences(line);
        dependences.crosswalks = 0;
        dependences.lines = 1;
        dependences
    }

    // Dependences

    pub fn get_line_dependences(&self, id: LineID) -> Dependences {
        let mut dependences = Dependences::default();
        for line in self.lines.values() {
            dependences.rules += line.rules_depending_on(id);
        }
        dependences.fillers = self.fillers.values().filter(|f| f.contains_line(id)).count();
        if self.crosswalks.contains_key(&id) {
            dependences.crosswalks = 1;
        }
        dependences.crosswalk_borders = self
            .crosswalks
            .values()
            .filter(|c| c.is_border(id))
            .count();
        dependences
    }

    pub fn get_point_dependences(&self, point: PointID) -> Dependences {
        let mut dependences = Dependences::default();
        for line in self.point_lines(point) {
            let more = self.get_line_dependences(line.id);
            dependences.lines += 1;
            dependences.rules += more.rules;
            dependences.crosswalks += more.crosswalks;
            dependences.crosswalk_borders += more.crosswalk_borders;
        }
        dependences.fillers = self
            .fillers
            .values()
            .filter(|f| f.contains_point(point))
            .count();
        dependences
    }

    pub fn get_enter_dependences(&self, enter: SegmentID) -> Dependences {
        let mut dependences = Dependences::default();
        for line in self.lines.values() {
            if line.start().enter == enter || line.end().enter == enter {
                dependences.lines += 1;
                if line.line_type() == LineType::Crosswalk {
                    dependences.crosswalks += 1;
                }
            }
        }
        dependences.fillers = self
            .fillers
            .values()
            .filter(|f| f.contour.contains_enter(enter))
            .count();
        dependences
    }

    // Rendering

    pub fn need_recalculate_batches(&self) -> bool {
        self.need_recalculate_batches
    }

    /// Rebuilds whatever changed since last time.
    pub fn render_batches(&mut self) -> &Vec<RenderBatch> {
        if self.need_recalculate_batches {
            self.recalculate_batches();
        }
        &self.batches
    }

    fn recalculate_batches(&mut self) {
        let missing: Vec<LineID> = self
            .lines
            .keys()
            .filter(|id| !self.line_dashes.contains_key(id))
            .copied()
            .collect();
        for id in missing {
            let dashes = match self.lines.get(&id) {
                Some(line) => line_dashes(self, line),
                None => continue,
            };
            self.line_dashes.insert(id, dashes);
        }

        let missing: Vec<LineID> = self
            .crosswalks
            .values()
            .filter(|c| c.dashes.is_none())
            .map(|c| c.line)
            .collect();
        for id in missing {
            let dashes = match self.crosswalks.get(&id) {
                Some(crosswalk) => crosswalk_dashes(self, crosswalk),
                None => continue,
            };
            if let Some(crosswalk) = self.crosswalks.get_mut(&id) {
                crosswalk.dashes = Some(dashes);
            }
        }

        let missing: Vec<FillerID> = self
            .fillers
            .values()
            .filter(|f| f.render.is_none())
            .map(|f| f.id)
            .collect();
        for id in missing {
            let data = match self.fillers.get(&id) {
                Some(filler) => filler_render(self, &filler.contour, &filler.style),
                None => continue,
            };
            if let Some(filler) = self.fillers.get_mut(&id) {
                filler.render = Some(data);
            }
        }

        let mut meshes: Vec<Mesh> = Vec::new();
        let all_dashes = self
            .line_dashes
            .values()
            .flatten()
            .chain(self.crosswalks.values().filter_map(|c| c.dashes.as_ref()).flatten())
            .chain(
                self.fillers
                    .values()
                    .filter_map(|f| f.render.as_ref())
                    .flat_map(|r| r.dashes.iter()),
            );
        for dash in all_dashes {
            meshes.push(Mesh::from_dash(dash, self.height));
        }
        for filler in self.fillers.values() {
            if let Some(ref render) = filler.render {
                meshes.extend(render.meshes.iter().cloned());
            }
        }

        self.batches = RenderBatch::build(&meshes, self.config.max_batch_vertices);
        self.need_recalculate_batches = false;
        debug!(
            "{}: rebuilt {} render batches from {} meshes",
            self.id,
            self.batches.len(),
            meshes.len()
        );
    }
}
