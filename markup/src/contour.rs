//! Building the closed outline of a filler, one vertex at a time. Vertices are points on enters,
//! crossings of two lines, or points pinned onto the line the outline follows. Whenever the
//! outline jumps between two enters, a connecting line is found or synthesized, so every side of
//! the finished outline is a concrete trajectory.

use anyhow::Result;

use geom::{Pt2D, Trajectory};

use crate::objects::{alignment_at, Alignment, LineID, LinePair, MarkupLine, PointID, PointPair};
use crate::{Markup, SegmentID};

/// A line the outline runs along. It's either stored in the markup or synthesized just for this
/// outline; synthesized lines aren't drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContourLine {
    pub id: LineID,
    /// At the line's first point
    pub alignment: Alignment,
}

impl ContourLine {
    pub fn of(line: &MarkupLine) -> ContourLine {
        ContourLine {
            id: line.id,
            alignment: line.alignment(),
        }
    }

    /// A line using `alignment` at `point`, one of its ends.
    pub fn connecting(id: LineID, point: PointID, alignment: Alignment) -> ContourLine {
        ContourLine {
            id,
            alignment: alignment_at(id, alignment, point),
        }
    }

    pub fn alignment_at(self, point: PointID) -> Alignment {
        alignment_at(self.id, self.alignment, point)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FillerVertexKind {
    Enter,
    Intersection,
    LineEnd,
}

impl FillerVertexKind {
    pub fn to_u8(self) -> u8 {
        match self {
            FillerVertexKind::Enter => 0,
            FillerVertexKind::Intersection => 1,
            FillerVertexKind::LineEnd => 2,
        }
    }

    pub fn from_u8(x: u8) -> Option<FillerVertexKind> {
        match x {
            0 => Some(FillerVertexKind::Enter),
            1 => Some(FillerVertexKind::Intersection),
            2 => Some(FillerVertexKind::LineEnd),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FillerVertex {
    /// A point on an enter
    Enter { point: PointID, alignment: Alignment },
    /// Where two stored lines cross
    Intersection(LinePair),
    /// A point, pinned onto the line the outline follows to or from it
    LineEnd { point: PointID, line: ContourLine },
}

impl FillerVertex {
    pub fn kind(&self) -> FillerVertexKind {
        match self {
            FillerVertex::Enter { .. } => FillerVertexKind::Enter,
            FillerVertex::Intersection(_) => FillerVertexKind::Intersection,
            FillerVertex::LineEnd { .. } => FillerVertexKind::LineEnd,
        }
    }

    pub fn point(&self) -> Option<PointID> {
        match self {
            FillerVertex::Enter { point, .. } | FillerVertex::LineEnd { point, .. } => Some(*point),
            FillerVertex::Intersection(_) => None,
        }
    }

    pub fn enter(&self) -> Option<SegmentID> {
        self.point().map(|p| p.enter)
    }

    /// The lines this vertex sits on.
    fn lines(&self, markup: &Markup) -> Vec<ContourLine> {
        match self {
            FillerVertex::Enter { .. } => Vec::new(),
            FillerVertex::Intersection(pair) => vec![
                markup.contour_line(pair.first()),
                markup.contour_line(pair.second()),
            ],
            FillerVertex::LineEnd { line, .. } => vec![markup.resolve_contour_line(*line)],
        }
    }

    pub fn alignment(&self, markup: &Markup) -> Alignment {
        let (point, alignment) = match self {
            FillerVertex::Enter { point, alignment } => (*point, *alignment),
            FillerVertex::LineEnd { point, line } => {
                (*point, markup.resolve_contour_line(*line).alignment_at(*point))
            }
            FillerVertex::Intersection(_) => return Alignment::Centre,
        };
        markup
            .get_point(point)
            .map(|p| p.effective_alignment(alignment))
            .unwrap_or(Alignment::Centre)
    }

    /// Pinned points collapse back to plain points; alignments on unsplit points collapse to the
    /// center.
    pub fn processed(&self, markup: &Markup) -> FillerVertex {
        match self {
            FillerVertex::Enter { point, .. } | FillerVertex::LineEnd { point, .. } => {
                FillerVertex::Enter {
                    point: *point,
                    alignment: self.alignment(markup),
                }
            }
            FillerVertex::Intersection(pair) => FillerVertex::Intersection(*pair),
        }
    }

    pub fn position(&self, markup: &Markup) -> Option<Pt2D> {
        match self {
            FillerVertex::Enter { point, alignment } => {
                Some(markup.get_point(*point)?.position_at(*alignment))
            }
            FillerVertex::LineEnd { point, line } => {
                let line = markup.resolve_contour_line(*line);
                let traj = markup.contour_line_trajectory(line)?;
                if *point == line.id.first() {
                    Some(traj.start_pt())
                } else {
                    Some(traj.end_pt())
                }
            }
            FillerVertex::Intersection(pair) => {
                let traj = markup.line_trajectory(pair.first())?;
                markup
                    .intersect(pair.first(), pair.second())
                    .position(&traj)
            }
        }
    }

    /// Where this vertex is along a line.
    pub fn t_on(&self, markup: &Markup, line: LineID) -> Option<f64> {
        match self {
            FillerVertex::Enter { point, .. } | FillerVertex::LineEnd { point, .. } => {
                if line.first() == *point {
                    Some(0.0)
                } else if line.second() == *point {
                    Some(1.0)
                } else {
                    None
                }
            }
            FillerVertex::Intersection(pair) => {
                if !pair.contains(line) {
                    return None;
                }
                markup.intersect(pair.first(), pair.second()).t_for(line)
            }
        }
    }

    /// Does everything this vertex references still exist?
    fn is_valid(&self, markup: &Markup) -> bool {
        match self {
            FillerVertex::Enter { point, .. } => markup.get_point(*point).is_some(),
            FillerVertex::LineEnd { point, line } => {
                line.id.contains(*point)
                    && markup.get_point(line.id.first()).is_some()
                    && markup.get_point(line.id.second()).is_some()
            }
            FillerVertex::Intersection(pair) => {
                markup.try_get_line(pair.first()).is_some()
                    && markup.try_get_line(pair.second()).is_some()
                    && markup.intersect(pair.first(), pair.second()).is_intersect()
            }
        }
    }

    fn references_line(&self, line: LineID) -> bool {
        match self {
            FillerVertex::Enter { .. } => false,
            FillerVertex::Intersection(pair) => pair.contains(line),
            FillerVertex::LineEnd { line: l, .. } => l.id == line,
        }
    }
}

/// What one side of the outline runs along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartEdge {
    Line(ContourLine),
    /// Straight along an enter's cut edge
    Enter(SegmentID),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillerPart {
    pub from: FillerVertex,
    pub to: FillerVertex,
    pub edge: PartEdge,
}

impl FillerPart {
    pub fn is_enter(&self) -> bool {
        matches!(self.edge, PartEdge::Enter(_))
    }

    pub fn trajectory(&self, markup: &Markup) -> Option<Trajectory> {
        match self.edge {
            PartEdge::Line(line) => {
                let traj = markup.contour_line_trajectory(line)?;
                let from = self.from.t_on(markup, line.id)?;
                let to = self.to.t_on(markup, line.id)?;
                traj.cut(from, to)
            }
            PartEdge::Enter(_) => {
                Trajectory::straight(self.from.position(markup)?, self.to.position(markup)?)
            }
        }
    }

    fn t_range(&self, markup: &Markup, line: LineID) -> Option<(f64, f64)> {
        Some((
            self.from.t_on(markup, line)?,
            self.to.t_on(markup, line)?,
        ))
    }
}

/// Which side of two consecutive vertices connects them.
fn common_edge(markup: &Markup, v1: &FillerVertex, v2: &FillerVertex) -> Option<PartEdge> {
    let lines1 = v1.lines(markup);
    let lines2 = v2.lines(markup);
    for l1 in &lines1 {
        if lines2.iter().any(|l2| l2.id == l1.id) {
            return Some(PartEdge::Line(*l1));
        }
    }
    // A plain point at the end of the other vertex's line
    for (vertex, lines) in [(v1, &lines2), (v2, &lines1)] {
        if let FillerVertex::Enter { point, .. } = vertex {
            if let Some(line) = lines.iter().find(|l| l.id.contains(*point)) {
                return Some(PartEdge::Line(*line));
            }
        }
    }
    match (v1.enter(), v2.enter()) {
        (Some(e1), Some(e2)) if e1 == e2 => Some(PartEdge::Enter(e1)),
        _ => None,
    }
}

/// The line of an intersection that ends at `point`.
fn line_touching(markup: &Markup, pair: LinePair, point: PointID) -> Result<ContourLine> {
    for line in [pair.first(), pair.second()] {
        if line.contains(point) {
            return Ok(markup.contour_line(line));
        }
    }
    bail!("neither line of {} touches {}", pair, point)
}

/// The stored line between two points, or a synthesized one. A split point at the start keeps
/// the half the outline already uses; otherwise the new point decides.
fn connector(
    markup: &Markup,
    from: PointID,
    from_alignment: Alignment,
    to: PointID,
    to_alignment: Alignment,
) -> ContourLine {
    let pair = PointPair::new(from, to);
    if let Some(line) = markup.try_get_line(pair) {
        return ContourLine::of(line);
    }
    let from_split = markup.get_point(from).map(|p| p.is_split()).unwrap_or(false);
    let alignment = if from_split {
        from_alignment
    } else {
        to_alignment.invert()
    };
    ContourLine::connecting(pair, from, alignment)
}

/// The admissible range of positions along a line, around a vertex at `t`.
struct TRange {
    t: f64,
    min: f64,
    max: f64,
}

impl TRange {
    fn set(&mut self, value: f64, strict: bool) {
        let below = if strict {
            value < self.t
        } else {
            value <= self.t
        };
        let above = if strict {
            value > self.t
        } else {
            value >= self.t
        };
        if self.min < value && below {
            self.min = value;
        }
        if self.max > value && above {
            self.max = value;
        }
    }
}

fn check_enter(num: u8, a: u8, b: u8) -> bool {
    a.min(b) <= num && num <= a.max(b)
}

#[derive(Clone, Debug, Default)]
pub struct FillerContour {
    vertices: Vec<FillerVertex>,
    complete: bool,
    processed_vertices: Vec<FillerVertex>,
    raw_parts: Vec<FillerPart>,
    processed_parts: Vec<FillerPart>,
    /// Some consecutive vertices have nothing connecting them
    broken: bool,
}

impl FillerContour {
    pub fn new() -> FillerContour {
        FillerContour::default()
    }

    /// Takes an already-built outline as is, for loading saved state.
    pub fn from_raw(markup: &Markup, vertices: Vec<FillerVertex>) -> Result<FillerContour> {
        let mut contour = FillerContour {
            vertices,
            complete: true,
            ..Default::default()
        };
        if let Some(v) = contour.vertices.iter().find(|v| !v.is_valid(markup)) {
            bail!("{:?} refers to something that doesn't exist", v);
        }
        contour.update(markup);
        if contour.broken {
            bail!("some sides of the outline aren't connected");
        }
        if contour.processed_parts.len() < 3 {
            bail!("outline only has {} sides", contour.processed_parts.len());
        }
        Ok(contour)
    }

    /// Builds an outline from scratch by adding every vertex, then the first again to close it.
    pub fn replay(markup: &Markup, vertices: &[FillerVertex]) -> Result<FillerContour> {
        let first = *vertices
            .first()
            .ok_or_else(|| anyhow!("no vertices to build an outline from"))?;
        let mut contour = FillerContour::new();
        for vertex in vertices {
            if contour.add(markup, *vertex)? {
                bail!("the outline closed before {:?}", vertex);
            }
        }
        if !contour.add(markup, first)? {
            bail!("the outline didn't close");
        }
        Ok(contour)
    }

    /// Appends a vertex. Returns true once the outline closes. On failure, nothing changes.
    pub fn add(&mut self, markup: &Markup, vertex: FillerVertex) -> Result<bool> {
        if self.complete {
            bail!("the outline is already closed");
        }
        if !vertex.is_valid(markup) {
            bail!("{:?} refers to something that doesn't exist", vertex);
        }

        let before = self.vertices.clone();
        if let Err(err) = self.add_impl(markup, vertex) {
            self.vertices = before;
            self.complete = false;
            self.update(markup);
            return Err(err);
        }
        self.update(markup);

        if self.complete && (self.broken || self.processed_parts.len() < 3) {
            let sides = self.processed_parts.len();
            self.vertices = before;
            self.complete = false;
            self.update(markup);
            bail!("closing the outline here leaves only {} sides", sides);
        }
        Ok(self.complete)
    }

    fn add_impl(&mut self, markup: &Markup, vertex: FillerVertex) -> Result<()> {
        let first = match self.vertices.first() {
            Some(v) => *v,
            None => {
                self.vertices.push(vertex);
                return Ok(());
            }
        };
        if first.processed(markup) == vertex.processed(markup) {
            return self.close(markup);
        }
        let vertex = self.transition(markup, vertex)?;
        self.vertices.push(vertex);
        Ok(())
    }

    /// Re-expresses the last vertex and the new one so they're connected by a concrete side.
    /// May change the current last vertex or append an extra one; returns what to append.
    fn transition(&mut self, markup: &Markup, vertex: FillerVertex) -> Result<FillerVertex> {
        let last_idx = self.vertices.len() - 1;
        let last = self.vertices[last_idx];
        match (last, vertex) {
            (FillerVertex::Enter { point, .. }, FillerVertex::Intersection(pair)) => {
                let line = line_touching(markup, pair, point)?;
                self.vertices[last_idx] = FillerVertex::LineEnd { point, line };
                Ok(vertex)
            }
            (FillerVertex::LineEnd { point, line }, FillerVertex::Intersection(pair)) => {
                let next = line_touching(markup, pair, point)?;
                if next.id != line.id {
                    self.vertices
                        .push(FillerVertex::LineEnd { point, line: next });
                }
                Ok(vertex)
            }
            (
                FillerVertex::Enter {
                    point: from,
                    alignment: from_alignment,
                },
                FillerVertex::Enter {
                    point: to,
                    alignment: to_alignment,
                },
            ) if from.enter != to.enter => {
                let line = connector(markup, from, from_alignment, to, to_alignment);
                self.vertices[last_idx] = FillerVertex::LineEnd { point: from, line };
                Ok(FillerVertex::LineEnd { point: to, line })
            }
            (
                FillerVertex::LineEnd {
                    point: from,
                    line: last_line,
                },
                FillerVertex::Enter {
                    point: to,
                    alignment: to_alignment,
                },
            ) if from.enter != to.enter => {
                if last_line.id == PointPair::new(from, to) {
                    return Ok(FillerVertex::LineEnd {
                        point: to,
                        line: last_line,
                    });
                }
                let line = connector(markup, from, last.alignment(markup), to, to_alignment);
                self.vertices
                    .push(FillerVertex::LineEnd { point: from, line });
                Ok(FillerVertex::LineEnd { point: to, line })
            }
            (FillerVertex::Intersection(pair), FillerVertex::Enter { point, .. }) => {
                Ok(FillerVertex::LineEnd {
                    point,
                    line: line_touching(markup, pair, point)?,
                })
            }
            (FillerVertex::Intersection(p1), FillerVertex::Intersection(p2)) => {
                if p1.contains(p2.first()) || p1.contains(p2.second()) {
                    Ok(vertex)
                } else {
                    bail!("{} and {} don't share a line", p1, p2)
                }
            }
            _ => Ok(vertex),
        }
    }

    fn close(&mut self, markup: &Markup) -> Result<()> {
        let n = self.vertices.len();
        let first = self.vertices[0];
        let last = self.vertices[n - 1];
        match (first.enter(), last.enter()) {
            // Starting and ending on the same enter; don't double back along it
            (Some(e1), Some(e2)) if e1 == e2 && n > 1 => {
                if n >= 3 && self.vertices[n - 2].enter() == Some(e1) {
                    self.vertices.pop();
                } else if self.vertices[1].enter() == Some(e1) {
                    self.vertices.remove(0);
                }
            }
            _ => {
                if common_edge(markup, &last, &first).is_none() {
                    let closing = self.transition(markup, first.processed(markup))?;
                    match first {
                        // The connector already reaches the plain starting point
                        FillerVertex::Enter { .. } if closing.point() == first.point() => {}
                        _ if closing != first => self.vertices.push(closing),
                        _ => {}
                    }
                }
            }
        }
        self.complete = true;
        Ok(())
    }

    /// Undoes the last append. Closed outlines can't be changed.
    pub fn remove(&mut self, markup: &Markup) {
        if self.complete || self.vertices.is_empty() {
            return;
        }
        let n = self.vertices.len();
        let last = self.vertices[n - 1];
        if n >= 2 {
            if let FillerVertex::LineEnd { point, .. } = self.vertices[n - 2] {
                let merge = n >= 3
                    && matches!(self.vertices[n - 3], FillerVertex::LineEnd { point: p, .. } if p == point)
                    && !markup
                        .get_point(point)
                        .map(|p| p.is_split())
                        .unwrap_or(false);
                if merge {
                    self.vertices.remove(n - 2);
                } else {
                    let alignment = match last {
                        FillerVertex::Intersection(pair) => line_touching(markup, pair, point)
                            .ok()
                            .map(|l| l.alignment_at(point)),
                        FillerVertex::LineEnd { line, .. } => {
                            Some(markup.resolve_contour_line(line).alignment_at(point))
                        }
                        FillerVertex::Enter { .. } => None,
                    };
                    if let Some(alignment) = alignment {
                        self.vertices[n - 2] = FillerVertex::Enter { point, alignment };
                    }
                }
            }
        }
        self.vertices.pop();
        self.update(markup);
    }

    /// Recomputes the processed vertices and both sets of sides.
    pub fn update(&mut self, markup: &Markup) {
        let mut processed = Vec::new();
        for v in &self.vertices {
            let p = v.processed(markup);
            if !processed.contains(&p) {
                processed.push(p);
            }
        }
        self.processed_vertices = processed;

        let (raw, raw_broken) = self.parts(markup, true);
        let (parts, broken) = self.parts(markup, false);
        self.raw_parts = raw;
        self.processed_parts = parts;
        self.broken = raw_broken || broken;
    }

    fn parts(&self, markup: &Markup, raw: bool) -> (Vec<FillerPart>, bool) {
        let n = self.vertices.len();
        let count = if self.complete { n } else { n.saturating_sub(1) };
        let mut parts = Vec::new();
        let mut broken = false;
        for idx in 0..count {
            let from = self.vertices[idx];
            let to = self.vertices[(idx + 1) % n];
            if let (
                FillerVertex::LineEnd { point: p1, .. },
                FillerVertex::LineEnd { point: p2, .. },
            ) = (from, to)
            {
                if p1 == p2 && (!raw || from.alignment(markup) == to.alignment(markup)) {
                    continue;
                }
            }
            match common_edge(markup, &from, &to) {
                Some(edge) => parts.push(FillerPart { from, to, edge }),
                None => broken = true,
            }
        }
        (parts, broken)
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn first(&self) -> Option<&FillerVertex> {
        self.vertices.first()
    }

    pub fn last(&self) -> Option<&FillerVertex> {
        self.vertices.last()
    }

    pub fn raw_vertices(&self) -> &Vec<FillerVertex> {
        &self.vertices
    }

    pub fn processed_vertices(&self) -> &Vec<FillerVertex> {
        &self.processed_vertices
    }

    pub fn raw_parts(&self) -> &Vec<FillerPart> {
        &self.raw_parts
    }

    pub fn processed_parts(&self) -> &Vec<FillerPart> {
        &self.processed_parts
    }

    pub fn raw_count(&self) -> usize {
        self.raw_parts.len()
    }

    pub fn processed_count(&self) -> usize {
        self.processed_parts.len()
    }

    /// One entry per side; None for sides that are too small to have a trajectory.
    pub fn trajectories_raw(&self, markup: &Markup) -> Vec<Option<Trajectory>> {
        self.raw_parts.iter().map(|p| p.trajectory(markup)).collect()
    }

    pub fn trajectories_processed(&self, markup: &Markup) -> Vec<Option<Trajectory>> {
        self.processed_parts
            .iter()
            .map(|p| p.trajectory(markup))
            .collect()
    }

    /// True when the outline runs along a split point or directly along an enter, meaning it
    /// fills a median.
    pub fn is_median(&self, markup: &Markup) -> bool {
        let n = self.vertices.len();
        for (idx, v) in self.vertices.iter().enumerate() {
            if let FillerVertex::Enter { point, .. } = v {
                if markup.get_point(*point).map(|p| p.is_split()).unwrap_or(false) {
                    return true;
                }
                if let FillerVertex::Enter { point: next, .. } = self.vertices[(idx + 1) % n] {
                    if n > 1 && next.enter == point.enter {
                        return true;
                    }
                }
            }
        }
        false
    }

    pub fn contains_line(&self, line: LineID) -> bool {
        self.vertices.iter().any(|v| v.references_line(line))
            || self
                .raw_parts
                .iter()
                .any(|p| matches!(p.edge, PartEdge::Line(l) if l.id == line))
    }

    pub fn contains_point(&self, point: PointID) -> bool {
        self.vertices.iter().any(|v| v.point() == Some(point))
    }

    pub fn contains_enter(&self, enter: SegmentID) -> bool {
        self.vertices.iter().any(|v| v.enter() == Some(enter))
    }

    /// Every vertex still refers to existing points and lines.
    pub fn is_valid(&self, markup: &Markup) -> bool {
        self.vertices.iter().all(|v| v.is_valid(markup))
    }

    /// For a vertex on `line`, the vertex's own position and the range around it that the next
    /// side may cover without crossing the sides already drawn.
    pub fn min_max_t(&self, markup: &Markup, vertex: &FillerVertex, line: LineID) -> (f64, f64, f64) {
        let mut range = TRange {
            t: vertex.t_on(markup, line).unwrap_or(0.0),
            min: -1.0,
            max: 2.0,
        };

        for part in &self.raw_parts {
            match part.edge {
                PartEdge::Line(part_line) if part_line.id == line => {
                    if let Some((from, to)) = part.t_range(markup, line) {
                        range.set(from, false);
                        range.set(to, false);
                    }
                }
                PartEdge::Line(part_line) => {
                    let hit = markup.intersect(line, part_line.id);
                    if let (Some(line_t), Some(part_t), Some((from, to))) = (
                        hit.t_for(line),
                        hit.t_for(part_line.id),
                        part.t_range(markup, part_line.id),
                    ) {
                        if from.min(to) <= part_t && part_t <= from.max(to) {
                            range.set(line_t, true);
                        }
                    }
                }
                PartEdge::Enter(enter) => {
                    if let (Some(a), Some(b)) = (part.from.point(), part.to.point()) {
                        if line.first().enter == enter && check_enter(line.first().num, a.num, b.num)
                        {
                            range.set(0.0, true);
                        }
                        if line.second().enter == enter
                            && check_enter(line.second().num, a.num, b.num)
                        {
                            range.set(1.0, true);
                        }
                    }
                }
            }
        }

        (range.t, range.min, range.max)
    }

    /// The exclusive range of point numbers on `point`'s enter that the outline may continue to
    /// along that enter.
    pub fn min_max_num(&self, markup: &Markup, point: PointID) -> (u8, u8) {
        if self.vertices.len() > 2 && self.vertices[0].point() == Some(point) {
            return (point.num, point.num);
        }
        let count = markup
            .try_get_enter(point.enter)
            .map(|e| e.point_count())
            .unwrap_or(0);
        let mut min = 0;
        let mut max = (count + 1).min(u8::MAX as usize) as u8;
        for v in &self.vertices {
            if let Some(p) = v.point() {
                if p.enter != point.enter {
                    continue;
                }
                if min < p.num && p.num < point.num {
                    min = p.num;
                }
                if max > p.num && p.num > point.num {
                    max = p.num;
                }
            }
        }
        (min, max)
    }

    /// False if the outline already runs along the enter over this point.
    pub fn is_available(&self, point: PointID) -> bool {
        for pair in self.vertices.windows(2) {
            if let (Some(a), Some(b)) = (pair[0].point(), pair[1].point()) {
                if a.enter == point.enter
                    && b.enter == point.enter
                    && check_enter(point.num, a.num, b.num)
                {
                    return false;
                }
            }
        }
        true
    }

    /// Candidate next vertices along one line from `vertex`.
    pub fn line_points(
        &self,
        markup: &Markup,
        vertex: &FillerVertex,
        line: &MarkupLine,
    ) -> Vec<FillerVertex> {
        let (t, min_t, max_t) = self.min_max_t(markup, vertex, line.id);
        let mut result = Vec::new();

        for other in markup.lines() {
            if other.id == line.id || !other.is_regular() {
                continue;
            }
            let hit = markup.intersect(line.id, other.id);
            if let Some(tt) = hit.t_for(line.id) {
                if tt != t && min_t < tt && tt < max_t {
                    result.push(FillerVertex::Intersection(hit.pair));
                }
            }
        }

        match self.vertices.first() {
            Some(FillerVertex::Enter { point, .. }) if line.id.contains(*point) => {
                if (*point == line.start() && min_t == 0.0) || (*point == line.end() && max_t == 1.0)
                {
                    result.push(self.vertices[0]);
                }
            }
            Some(FillerVertex::Intersection(pair)) if pair.contains(line.id) => {
                if let Some(first_t) = self.vertices[0].t_on(markup, line.id) {
                    if first_t == min_t || first_t == max_t {
                        result.push(self.vertices[0]);
                    }
                }
            }
            _ => {}
        }

        if t != 0.0 && min_t < 0.0 && 0.0 < max_t {
            result.push(FillerVertex::Enter {
                point: line.start(),
                alignment: line.alignment_at(line.start()),
            });
        }
        if t != 1.0 && min_t < 1.0 && 1.0 < max_t {
            result.push(FillerVertex::Enter {
                point: line.end(),
                alignment: line.alignment_at(line.end()),
            });
        }
        result
    }

    /// Every point on every enter, with each half of split points.
    pub fn begin_candidates(markup: &Markup) -> Vec<FillerVertex> {
        let mut result = Vec::new();
        for enter in markup.enters() {
            for point in enter.points() {
                push_point_candidates(&mut result, point.id, point.is_split());
            }
        }
        for intersect in markup.intersects() {
            result.push(FillerVertex::Intersection(intersect.pair));
        }
        result
    }

    /// The vertices the outline may continue to.
    pub fn next_candidates(&self, markup: &Markup) -> Vec<FillerVertex> {
        let last = match self.vertices.last() {
            Some(v) => *v,
            None => return FillerContour::begin_candidates(markup),
        };
        if self.complete {
            return Vec::new();
        }

        let mut result = Vec::new();
        match last {
            FillerVertex::Enter { point, .. } | FillerVertex::LineEnd { point, .. } => {
                for line in markup.lines() {
                    if line.is_regular() && line.id.contains(point) {
                        result.extend(self.line_points(markup, &last, line));
                    }
                }

                // Along the same enter
                let (min, max) = self.min_max_num(markup, point);
                if let Some(enter) = markup.try_get_enter(point.enter) {
                    for p in enter.points() {
                        if min < p.id.num && p.id.num < max && p.id != point && self.is_available(p.id)
                        {
                            push_point_candidates(&mut result, p.id, p.is_split());
                        }
                    }
                }
                if self.vertices.len() > 2 {
                    if let Some(first_point) = self.vertices[0].point() {
                        if first_point.enter == point.enter && first_point != point {
                            result.push(self.vertices[0].processed(markup));
                        }
                    }
                }

                // Jumping to another enter synthesizes a connecting line
                for enter in markup.enters() {
                    if enter.id == point.enter {
                        continue;
                    }
                    for p in enter.points() {
                        push_point_candidates(&mut result, p.id, p.is_split());
                    }
                }
            }
            FillerVertex::Intersection(pair) => {
                for id in [pair.first(), pair.second()] {
                    if let Some(line) = markup.try_get_line(id) {
                        result.extend(self.line_points(markup, &last, line));
                    }
                }
            }
        }

        let mut deduped = Vec::new();
        for v in result {
            if !deduped.contains(&v) {
                deduped.push(v);
            }
        }
        deduped
    }
}

fn push_point_candidates(result: &mut Vec<FillerVertex>, point: PointID, split: bool) {
    if split {
        for alignment in [Alignment::Left, Alignment::Right] {
            result.push(FillerVertex::Enter { point, alignment });
        }
    } else {
        result.push(FillerVertex::Enter {
            point,
            alignment: Alignment::Centre,
        });
    }
}
