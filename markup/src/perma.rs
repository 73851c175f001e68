//! Saving markup as XML, and loading it back. Loading goes through an `ObjectsMap`, so saved
//! markup can land on renumbered nodes, segments and points.

use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{Context, Result};
use xmltree::{Element, XMLNode};

use geom::{Angle, Distance};

use crate::contour::{ContourLine, FillerContour, FillerVertex, FillerVertexKind};
use crate::objects::{
    Alignment, FillerID, LineID, LineKind, LinePair, LineRule, LineType, PointID, PointPair,
    RuleEdge,
};
use crate::style::{
    Color, CrosswalkStyle, Filler3D, FillerStyle, LineStyle, MaterialType, StopLineStyle,
};
use crate::{Markup, NodeID, SegmentID};

pub const ROOT_TAG: &str = "NodeMarkup";
const NODE_TAG: &str = "M";
const POINT_TAG: &str = "P";
const LINE_TAG: &str = "L";
const RULE_TAG: &str = "R";
const STYLE_TAG: &str = "S";
const FILLER_TAG: &str = "F";
const VERTEX_TAG: &str = "V";
const CROSSWALK_TAG: &str = "C";

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum ObjectID {
    Node(NodeID),
    Segment(SegmentID),
    Point(PointID),
}

/// Old identity to new identity. Anything not mentioned maps to itself. Points on a remapped
/// segment follow their segment and keep their number, unless mapped explicitly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectsMap {
    map: BTreeMap<ObjectID, ObjectID>,
}

impl ObjectsMap {
    pub fn new() -> ObjectsMap {
        ObjectsMap::default()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn add_node(&mut self, old: NodeID, new: NodeID) {
        self.map.insert(ObjectID::Node(old), ObjectID::Node(new));
    }

    pub fn add_segment(&mut self, old: SegmentID, new: SegmentID) {
        self.map
            .insert(ObjectID::Segment(old), ObjectID::Segment(new));
    }

    pub fn add_point(&mut self, old: PointID, new: PointID) {
        self.map.insert(ObjectID::Point(old), ObjectID::Point(new));
    }

    /// For a segment that was flipped around: points are numbered from the other side.
    pub fn add_mirror_enter(&mut self, old: SegmentID, new: SegmentID, point_count: u8) {
        self.add_segment(old, new);
        for num in 1..=point_count {
            self.add_point(
                PointID::new(old, num),
                PointID::new(new, point_count + 1 - num),
            );
        }
    }

    /// Nodes may be renamed more than once, like when a node is copied and then its original is
    /// replaced. Follows the whole chain.
    pub fn map_node(&self, id: NodeID) -> NodeID {
        let mut current = id;
        for _ in 0..=self.map.len() {
            match self.map.get(&ObjectID::Node(current)) {
                Some(ObjectID::Node(next)) if *next != current => {
                    current = *next;
                }
                _ => break,
            }
        }
        current
    }

    pub fn map_segment(&self, id: SegmentID) -> SegmentID {
        match self.map.get(&ObjectID::Segment(id)) {
            Some(ObjectID::Segment(new)) => *new,
            _ => id,
        }
    }

    pub fn map_point(&self, id: PointID) -> PointID {
        match self.map.get(&ObjectID::Point(id)) {
            Some(ObjectID::Point(new)) => *new,
            _ => PointID::new(self.map_segment(id.enter), id.num),
        }
    }

    /// Records that `old` became `new`, also redirecting anything that already led to `old`.
    pub fn chain_segment(&mut self, old: SegmentID, new: SegmentID) {
        for value in self.map.values_mut() {
            match value {
                ObjectID::Segment(id) if *id == old => {
                    *id = new;
                }
                ObjectID::Point(point) if point.enter == old => {
                    point.enter = new;
                }
                _ => {}
            }
        }
        self.map
            .entry(ObjectID::Segment(old))
            .or_insert(ObjectID::Segment(new));
    }

    /// Entries in `other` win.
    pub fn extend(&mut self, other: &ObjectsMap) {
        for (k, v) in &other.map {
            self.map.insert(*k, *v);
        }
    }

    fn map_line(&self, id: LineID) -> (LineID, bool) {
        let first = self.map_point(id.first());
        let second = self.map_point(id.second());
        let new = PointPair::new(first, second);
        // If the endpoints trade places, alignments recorded at the first point flip
        (new, new.first() != first)
    }
}

// Reading attributes

fn attr<T: FromStr>(elem: &Element, key: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = elem
        .attributes
        .get(key)
        .ok_or_else(|| anyhow!("<{}> is missing {}", elem.name, key))?;
    raw.parse::<T>()
        .with_context(|| format!("<{}> has a bad {}: {}", elem.name, key, raw))
}

fn opt_attr<T: FromStr>(elem: &Element, key: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if elem.attributes.contains_key(key) {
        Ok(Some(attr(elem, key)?))
    } else {
        Ok(None)
    }
}

fn dist_attr(elem: &Element, key: &str) -> Result<Distance> {
    let x: f64 = attr(elem, key)?;
    if !x.is_finite() {
        bail!("<{}> has a bad {}: {}", elem.name, key, x);
    }
    Ok(Distance::meters(x))
}

fn color_attr(elem: &Element, key: &str) -> Result<Color> {
    let raw: String = attr(elem, key)?;
    Color::from_hex(&raw)
}

fn alignment_attr(elem: &Element, key: &str) -> Result<Alignment> {
    Alignment::from_u8(attr(elem, key)?)
}

fn point_attr(elem: &Element, key: &str, map: &ObjectsMap) -> Result<PointID> {
    Ok(map.map_point(PointID::decode_u32(attr(elem, key)?)))
}

fn set(elem: &mut Element, key: &str, value: impl ToString) {
    elem.attributes.insert(key.to_string(), value.to_string());
}

fn set_dist(elem: &mut Element, key: &str, value: Distance) {
    set(elem, key, value.inner_meters());
}

fn child_elements<'a>(elem: &'a Element, tag: &'a str) -> impl Iterator<Item = &'a Element> {
    elem.children
        .iter()
        .filter_map(|node| node.as_element())
        .filter(move |e| e.name == tag)
}

fn style_child(elem: &Element) -> Result<&Element> {
    elem.get_child(STYLE_TAG)
        .ok_or_else(|| anyhow!("<{}> has no style", elem.name))
}

// Styles

fn material_name(material: MaterialType) -> &'static str {
    match material {
        MaterialType::Pavement => "Pavement",
        MaterialType::Grass => "Grass",
        MaterialType::Gravel => "Gravel",
        MaterialType::Ruined => "Ruined",
        MaterialType::Cliff => "Cliff",
    }
}

fn parse_material(raw: &str) -> Result<MaterialType> {
    Ok(match raw {
        "Pavement" => MaterialType::Pavement,
        "Grass" => MaterialType::Grass,
        "Gravel" => MaterialType::Gravel,
        "Ruined" => MaterialType::Ruined,
        "Cliff" => MaterialType::Cliff,
        _ => bail!("unknown material {}", raw),
    })
}

fn style_elem(kind: &str) -> Element {
    let mut elem = Element::new(STYLE_TAG);
    set(&mut elem, "T", kind);
    elem
}

fn style_kind(elem: &Element) -> Result<String> {
    attr(elem, "T")
}

fn line_style_to_xml(style: &LineStyle) -> Element {
    match *style {
        LineStyle::Solid { color, width } => {
            let mut elem = style_elem("Solid");
            set(&mut elem, "C", color.to_hex());
            set_dist(&mut elem, "W", width);
            elem
        }
        LineStyle::Dashed {
            color,
            width,
            dash_length,
            space_length,
        } => {
            let mut elem = style_elem("Dashed");
            set(&mut elem, "C", color.to_hex());
            set_dist(&mut elem, "W", width);
            set_dist(&mut elem, "DL", dash_length);
            set_dist(&mut elem, "SL", space_length);
            elem
        }
        LineStyle::DoubleSolid {
            color,
            width,
            offset,
        } => {
            let mut elem = style_elem("DoubleSolid");
            set(&mut elem, "C", color.to_hex());
            set_dist(&mut elem, "W", width);
            set_dist(&mut elem, "O", offset);
            elem
        }
        LineStyle::DoubleDashed {
            color,
            width,
            dash_length,
            space_length,
            offset,
        } => {
            let mut elem = style_elem("DoubleDashed");
            set(&mut elem, "C", color.to_hex());
            set_dist(&mut elem, "W", width);
            set_dist(&mut elem, "DL", dash_length);
            set_dist(&mut elem, "SL", space_length);
            set_dist(&mut elem, "O", offset);
            elem
        }
    }
}

fn line_style_from_xml(elem: &Element) -> Result<LineStyle> {
    let color = color_attr(elem, "C")?;
    let width = dist_attr(elem, "W")?;
    Ok(match style_kind(elem)?.as_str() {
        "Solid" => LineStyle::Solid { color, width },
        "Dashed" => LineStyle::Dashed {
            color,
            width,
            dash_length: dist_attr(elem, "DL")?,
            space_length: dist_attr(elem, "SL")?,
        },
        "DoubleSolid" => LineStyle::DoubleSolid {
            color,
            width,
            offset: dist_attr(elem, "O")?,
        },
        "DoubleDashed" => LineStyle::DoubleDashed {
            color,
            width,
            dash_length: dist_attr(elem, "DL")?,
            space_length: dist_attr(elem, "SL")?,
            offset: dist_attr(elem, "O")?,
        },
        x => bail!("unknown line style {}", x),
    })
}

fn stop_style_to_xml(style: &StopLineStyle) -> Element {
    match *style {
        StopLineStyle::Solid { color, width } => {
            let mut elem = style_elem("Solid");
            set(&mut elem, "C", color.to_hex());
            set_dist(&mut elem, "W", width);
            elem
        }
        StopLineStyle::Dashed {
            color,
            width,
            dash_length,
            space_length,
        } => {
            let mut elem = style_elem("Dashed");
            set(&mut elem, "C", color.to_hex());
            set_dist(&mut elem, "W", width);
            set_dist(&mut elem, "DL", dash_length);
            set_dist(&mut elem, "SL", space_length);
            elem
        }
    }
}

fn stop_style_from_xml(elem: &Element) -> Result<StopLineStyle> {
    let color = color_attr(elem, "C")?;
    let width = dist_attr(elem, "W")?;
    Ok(match style_kind(elem)?.as_str() {
        "Solid" => StopLineStyle::Solid { color, width },
        "Dashed" => StopLineStyle::Dashed {
            color,
            width,
            dash_length: dist_attr(elem, "DL")?,
            space_length: dist_attr(elem, "SL")?,
        },
        x => bail!("unknown stop line style {}", x),
    })
}

fn crosswalk_style_to_xml(style: &CrosswalkStyle) -> Element {
    match *style {
        CrosswalkStyle::Existent { width } => {
            let mut elem = style_elem("Existent");
            set_dist(&mut elem, "W", width);
            elem
        }
        CrosswalkStyle::Zebra {
            color,
            width,
            offset_before,
            dash_length,
            space_length,
        } => {
            let mut elem = style_elem("Zebra");
            set(&mut elem, "C", color.to_hex());
            set_dist(&mut elem, "W", width);
            set_dist(&mut elem, "OB", offset_before);
            set_dist(&mut elem, "DL", dash_length);
            set_dist(&mut elem, "SL", space_length);
            elem
        }
        CrosswalkStyle::DoubleSolid {
            color,
            width,
            offset_before,
            line_width,
        } => {
            let mut elem = style_elem("DoubleSolid");
            set(&mut elem, "C", color.to_hex());
            set_dist(&mut elem, "W", width);
            set_dist(&mut elem, "OB", offset_before);
            set_dist(&mut elem, "LW", line_width);
            elem
        }
    }
}

fn crosswalk_style_from_xml(elem: &Element) -> Result<CrosswalkStyle> {
    let width = dist_attr(elem, "W")?;
    Ok(match style_kind(elem)?.as_str() {
        "Existent" => CrosswalkStyle::Existent { width },
        "Zebra" => CrosswalkStyle::Zebra {
            color: color_attr(elem, "C")?,
            width,
            offset_before: dist_attr(elem, "OB")?,
            dash_length: dist_attr(elem, "DL")?,
            space_length: dist_attr(elem, "SL")?,
        },
        "DoubleSolid" => CrosswalkStyle::DoubleSolid {
            color: color_attr(elem, "C")?,
            width,
            offset_before: dist_attr(elem, "OB")?,
            line_width: dist_attr(elem, "LW")?,
        },
        x => bail!("unknown crosswalk style {}", x),
    })
}

fn filler_style_to_xml(style: &FillerStyle) -> Element {
    match *style {
        FillerStyle::Stripe {
            color,
            width,
            step,
            angle,
        }
        | FillerStyle::Grid {
            color,
            width,
            step,
            angle,
        } => {
            let mut elem = style_elem(if matches!(style, FillerStyle::Stripe { .. }) {
                "Stripe"
            } else {
                "Grid"
            });
            set(&mut elem, "C", color.to_hex());
            set_dist(&mut elem, "W", width);
            set_dist(&mut elem, "ST", step);
            set(&mut elem, "A", angle.normalized_radians());
            elem
        }
        FillerStyle::Solid { color } => {
            let mut elem = style_elem("Solid");
            set(&mut elem, "C", color.to_hex());
            elem
        }
        FillerStyle::Raised { material, settings } => {
            let mut elem = style_elem("Raised");
            set(&mut elem, "M", material_name(material));
            set_dist(&mut elem, "E", settings.elevation);
            set_dist(&mut elem, "CR", settings.corner_radius);
            set_dist(&mut elem, "MCR", settings.median_corner_radius);
            elem
        }
    }
}

fn filler_style_from_xml(elem: &Element) -> Result<FillerStyle> {
    let kind = style_kind(elem)?;
    Ok(match kind.as_str() {
        "Stripe" | "Grid" => {
            let color = color_attr(elem, "C")?;
            let width = dist_attr(elem, "W")?;
            let step = dist_attr(elem, "ST")?;
            let angle = Angle::new_rads(attr(elem, "A")?);
            if kind == "Stripe" {
                FillerStyle::Stripe {
                    color,
                    width,
                    step,
                    angle,
                }
            } else {
                FillerStyle::Grid {
                    color,
                    width,
                    step,
                    angle,
                }
            }
        }
        "Solid" => FillerStyle::Solid {
            color: color_attr(elem, "C")?,
        },
        "Raised" => {
            let material: String = attr(elem, "M")?;
            FillerStyle::Raised {
                material: parse_material(&material)?,
                settings: Filler3D {
                    elevation: dist_attr(elem, "E")?,
                    corner_radius: dist_attr(elem, "CR")?,
                    median_corner_radius: dist_attr(elem, "MCR")?,
                },
            }
        }
        x => bail!("unknown filler style {}", x),
    })
}

// Rule edges are written like "P1234" or "L5678"

fn rule_edge_to_string(edge: RuleEdge) -> String {
    match edge {
        RuleEdge::LineEnd(point) => format!("P{}", point.encode_u32()),
        RuleEdge::Intersection(line) => format!("L{}", line.encode_u64()),
    }
}

fn rule_edge_from_string(raw: &str, map: &ObjectsMap) -> Result<RuleEdge> {
    if let Some(x) = raw.strip_prefix('P') {
        let point = PointID::decode_u32(x.parse().with_context(|| format!("rule edge {}", raw))?);
        Ok(RuleEdge::LineEnd(map.map_point(point)))
    } else if let Some(x) = raw.strip_prefix('L') {
        let line = PointPair::decode_u64(x.parse().with_context(|| format!("rule edge {}", raw))?);
        Ok(RuleEdge::Intersection(map.map_line(line).0))
    } else {
        bail!("bad rule edge {}", raw)
    }
}

fn vertex_to_xml(vertex: &FillerVertex) -> Element {
    let mut elem = Element::new(VERTEX_TAG);
    set(&mut elem, "T", vertex.kind().to_u8());
    match vertex {
        FillerVertex::Enter { point, alignment } => {
            set(&mut elem, "P", point.encode_u32());
            set(&mut elem, "A", alignment.to_u8());
        }
        FillerVertex::Intersection(pair) => {
            set(&mut elem, "L1", pair.first().encode_u64());
            set(&mut elem, "L2", pair.second().encode_u64());
        }
        FillerVertex::LineEnd { point, line } => {
            set(&mut elem, "P", point.encode_u32());
            set(&mut elem, "L", line.id.encode_u64());
            set(&mut elem, "A", line.alignment.to_u8());
        }
    }
    elem
}

fn vertex_from_xml(elem: &Element, map: &ObjectsMap) -> Result<FillerVertex> {
    let kind = FillerVertexKind::from_u8(attr(elem, "T")?)
        .ok_or_else(|| anyhow!("unknown vertex type {:?}", elem.attributes.get("T")))?;
    Ok(match kind {
        FillerVertexKind::Enter => FillerVertex::Enter {
            point: point_attr(elem, "P", map)?,
            alignment: alignment_attr(elem, "A")?,
        },
        FillerVertexKind::Intersection => {
            let a = map.map_line(PointPair::decode_u64(attr(elem, "L1")?)).0;
            let b = map.map_line(PointPair::decode_u64(attr(elem, "L2")?)).0;
            FillerVertex::Intersection(LinePair::new(a, b))
        }
        FillerVertexKind::LineEnd => {
            let (id, flipped) = map.map_line(PointPair::decode_u64(attr(elem, "L")?));
            let mut alignment = alignment_attr(elem, "A")?;
            if flipped {
                alignment = alignment.invert();
            }
            FillerVertex::LineEnd {
                point: point_attr(elem, "P", map)?,
                line: ContourLine { id, alignment },
            }
        }
    })
}

impl Markup {
    pub fn to_xml(&self) -> Element {
        let mut root = Element::new(NODE_TAG);
        set(&mut root, "Id", self.id.0);

        for enter in self.enters() {
            for point in enter.points() {
                let mut elem = Element::new(POINT_TAG);
                set(&mut elem, "Id", point.id.encode_u32());
                set_dist(&mut elem, "O", point.offset());
                set(&mut elem, "S", point.is_split() as u8);
                set_dist(&mut elem, "SO", point.split_offset());
                root.children.push(XMLNode::Element(elem));
            }
        }

        for line in self.lines() {
            let mut elem = Element::new(LINE_TAG);
            set(&mut elem, "Id", line.id.encode_u64());
            set(&mut elem, "K", line.line_type().to_u8());
            set(&mut elem, "A", line.alignment().to_u8());
            match line.kind {
                LineKind::Regular { ref rules } => {
                    for rule in rules {
                        let mut rule_elem = Element::new(RULE_TAG);
                        set(&mut rule_elem, "F", rule_edge_to_string(rule.from));
                        set(&mut rule_elem, "T", rule_edge_to_string(rule.to));
                        rule_elem
                            .children
                            .push(XMLNode::Element(line_style_to_xml(&rule.style)));
                        elem.children.push(XMLNode::Element(rule_elem));
                    }
                }
                LineKind::Stop { ref style } => {
                    elem.children
                        .push(XMLNode::Element(stop_style_to_xml(style)));
                }
                LineKind::Crosswalk => {}
            }
            root.children.push(XMLNode::Element(elem));
        }

        for filler in self.fillers() {
            let mut elem = Element::new(FILLER_TAG);
            set(&mut elem, "Id", filler.id.0);
            elem.children
                .push(XMLNode::Element(filler_style_to_xml(&filler.style)));
            for vertex in filler.contour.raw_vertices() {
                elem.children.push(XMLNode::Element(vertex_to_xml(vertex)));
            }
            root.children.push(XMLNode::Element(elem));
        }

        for crosswalk in self.crosswalks() {
            let mut elem = Element::new(CROSSWALK_TAG);
            set(&mut elem, "L", crosswalk.line.encode_u64());
            if let Some(border) = crosswalk.left_border() {
                set(&mut elem, "LB", border.encode_u64());
            }
            if let Some(border) = crosswalk.right_border() {
                set(&mut elem, "RB", border.encode_u64());
            }
            elem.children
                .push(XMLNode::Element(crosswalk_style_to_xml(&crosswalk.style)));
            root.children.push(XMLNode::Element(elem));
        }

        root
    }

    /// The node a saved `<M>` element belongs to, after remapping.
    pub fn node_id_from_xml(elem: &Element, map: &ObjectsMap) -> Result<NodeID> {
        if elem.name != NODE_TAG {
            bail!("expected <{}>, got <{}>", NODE_TAG, elem.name);
        }
        Ok(map.map_node(NodeID(attr(elem, "Id")?)))
    }

    /// Replaces everything with saved state, then refreshes caches.
    pub fn load_xml(&mut self, elem: &Element, map: &ObjectsMap) -> Result<()> {
        self.clear();
        self.load_xml_body(elem, map)?;
        self.recalculate();
        Ok(())
    }

    /// Adds saved state on top of whatever is here. Things referring to points or lines that
    /// don't exist here are skipped; malformed XML is an error.
    pub(crate) fn load_xml_body(&mut self, elem: &Element, map: &ObjectsMap) -> Result<()> {
        for point_elem in child_elements(elem, POINT_TAG) {
            let id = point_attr(point_elem, "Id", map)?;
            let offset = dist_attr(point_elem, "O")?;
            let split = attr::<u8>(point_elem, "S")? != 0;
            let split_offset = dist_attr(point_elem, "SO")?;
            if self.get_point(id).is_none() {
                debug!("{}: skipping saved {}", self.id, id);
                continue;
            }
            self.set_point_offset(id, offset)?;
            self.load_point_split(id, split, split_offset);
        }

        // Create every line first, since rules refer to other lines
        let mut pending_rules: Vec<(LineID, Vec<LineRule>)> = Vec::new();
        for line_elem in child_elements(elem, LINE_TAG) {
            let (id, flipped) = map.map_line(PointPair::decode_u64(attr(line_elem, "Id")?));
            let line_type = LineType::from_u8(attr(line_elem, "K")?)
                .ok_or_else(|| anyhow!("unknown line type {:?}", line_elem.attributes.get("K")))?;
            let mut alignment = alignment_attr(line_elem, "A")?;
            if flipped {
                alignment = alignment.invert();
            }

            let kind = match line_type {
                LineType::Regular => {
                    let mut rules = Vec::new();
                    for rule_elem in child_elements(line_elem, RULE_TAG) {
                        let from: String = attr(rule_elem, "F")?;
                        let to: String = attr(rule_elem, "T")?;
                        rules.push(LineRule {
                            from: rule_edge_from_string(&from, map)?,
                            to: rule_edge_from_string(&to, map)?,
                            style: line_style_from_xml(style_child(rule_elem)?)?,
                        });
                    }
                    pending_rules.push((id, rules));
                    LineKind::Regular { rules: Vec::new() }
                }
                LineType::Stop => LineKind::Stop {
                    style: stop_style_from_xml(style_child(line_elem)?)?,
                },
                // The crosswalk itself restores the line
                LineType::Crosswalk => continue,
            };
            if let Err(err) = self.insert_line(id, alignment, kind) {
                warn!("{}: skipping saved {}: {}", self.id, id, err);
            }
        }
        for (id, rules) in pending_rules {
            if !self.exist_connection(id) {
                continue;
            }
            for rule in rules {
                if let Err(err) = self.add_rule(id, rule) {
                    warn!("{}: skipping a rule on {}: {}", self.id, id, err);
                }
            }
        }

        for crosswalk_elem in child_elements(elem, CROSSWALK_TAG) {
            let id = map.map_line(PointPair::decode_u64(attr(crosswalk_elem, "L")?)).0;
            let style = crosswalk_style_from_xml(style_child(crosswalk_elem)?)?;
            let left = opt_attr::<u64>(crosswalk_elem, "LB")?
                .map(|x| map.map_line(PointPair::decode_u64(x)).0);
            let right = opt_attr::<u64>(crosswalk_elem, "RB")?
                .map(|x| map.map_line(PointPair::decode_u64(x)).0);
            if let Err(err) = self.add_crosswalk(id, style) {
                warn!("{}: skipping saved crosswalk {}: {}", self.id, id, err);
                continue;
            }
            let left = left.filter(|l| self.exist_connection(*l));
            let right = right.filter(|l| self.exist_connection(*l));
            self.set_crosswalk_borders(id, left, right)?;
        }

        for filler_elem in child_elements(elem, FILLER_TAG) {
            let saved = opt_attr::<usize>(filler_elem, "Id")?.map(FillerID);
            let style = filler_style_from_xml(style_child(filler_elem)?)?;
            let mut vertices = Vec::new();
            for vertex_elem in child_elements(filler_elem, VERTEX_TAG) {
                vertices.push(vertex_from_xml(vertex_elem, map)?);
            }
            let contour = match FillerContour::from_raw(self, vertices) {
                Ok(contour) => contour,
                Err(err) => {
                    warn!("{}: skipping a saved filler: {}", self.id, err);
                    continue;
                }
            };
            self.insert_filler(saved, contour, style)?;
        }

        Ok(())
    }
}

/// Wraps many nodes' markup in one document.
pub fn root_element(nodes: Vec<Element>) -> Element {
    let mut root = Element::new(ROOT_TAG);
    for node in nodes {
        root.children.push(XMLNode::Element(node));
    }
    root
}

pub fn node_elements(root: &Element) -> impl Iterator<Item = &Element> {
    child_elements(root, NODE_TAG)
}

pub fn write_xml(root: &Element) -> Result<String> {
    let mut bytes: Vec<u8> = Vec::new();
    root.write_with_config(
        &mut bytes,
        xmltree::EmitterConfig::new().perform_indent(true),
    )?;
    Ok(String::from_utf8(bytes)?)
}

pub fn parse_xml(raw: &str) -> Result<Element> {
    let root = Element::parse(raw.as_bytes())?;
    if root.name != ROOT_TAG {
        bail!("expected <{}>, got <{}>", ROOT_TAG, root.name);
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_segments_and_points() {
        let mut map = ObjectsMap::new();
        map.add_segment(SegmentID(1), SegmentID(7));
        map.add_point(PointID::new(SegmentID(2), 1), PointID::new(SegmentID(2), 3));
        assert_eq!(
            map.map_point(PointID::new(SegmentID(1), 4)),
            PointID::new(SegmentID(7), 4)
        );
        assert_eq!(
            map.map_point(PointID::new(SegmentID(2), 1)),
            PointID::new(SegmentID(2), 3)
        );
        assert_eq!(map.map_segment(SegmentID(3)), SegmentID(3));

        map.chain_segment(SegmentID(7), SegmentID(9));
        assert_eq!(map.map_segment(SegmentID(1)), SegmentID(9));
        assert_eq!(map.map_segment(SegmentID(7)), SegmentID(9));
    }

    #[test]
    fn nodes_remap_transitively() {
        let mut map = ObjectsMap::new();
        map.add_node(NodeID(1), NodeID(2));
        map.add_node(NodeID(2), NodeID(3));
        assert_eq!(map.map_node(NodeID(1)), NodeID(3));
        // Cycles terminate
        map.add_node(NodeID(3), NodeID(1));
        let _ = map.map_node(NodeID(1));
    }

    #[test]
    fn mirrored_enter_flips_alignment() {
        let a = PointID::new(SegmentID(1), 1);
        let b = PointID::new(SegmentID(2), 2);
        let mut map = ObjectsMap::new();
        map.add_segment(SegmentID(1), SegmentID(5));
        let (line, flipped) = map.map_line(PointPair::new(a, b));
        assert_eq!(line.first(), b);
        assert!(flipped);

        map.add_mirror_enter(SegmentID(2), SegmentID(2), 3);
        assert_eq!(map.map_point(b), b);
        assert_eq!(
            map.map_point(PointID::new(SegmentID(2), 1)),
            PointID::new(SegmentID(2), 3)
        );
    }

    #[test]
    fn styles_survive_xml() {
        for style in [
            FillerStyle::default_stripe(),
            FillerStyle::Solid {
                color: Color::YELLOW,
            },
            FillerStyle::raised(MaterialType::Grass),
        ] {
            assert_eq!(
                filler_style_from_xml(&filler_style_to_xml(&style)).unwrap(),
                style
            );
        }
        let style = LineStyle::DoubleDashed {
            color: Color::YELLOW,
            width: Distance::meters(0.15),
            dash_length: Distance::meters(1.0),
            space_length: Distance::meters(2.0),
            offset: Distance::meters(0.2),
        };
        assert_eq!(
            line_style_from_xml(&line_style_to_xml(&style)).unwrap(),
            style
        );

        let mut broken = line_style_to_xml(&LineStyle::default_solid());
        broken.attributes.remove("W");
        assert!(line_style_from_xml(&broken).is_err());
    }

    #[test]
    fn rule_edges() {
        let map = ObjectsMap::new();
        let point = PointID::new(SegmentID(3), 2);
        let edge = RuleEdge::LineEnd(point);
        assert_eq!(
            rule_edge_from_string(&rule_edge_to_string(edge), &map).unwrap(),
            edge
        );
        assert!(rule_edge_from_string("X12", &map).is_err());
    }
}
