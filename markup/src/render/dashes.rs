use abstutil::skip_fail;
use geom::{Angle, Distance, Line, Pt2D, Trajectory, EPSILON_T};

use crate::objects::{Crosswalk, LineKind, MarkupLine};
use crate::render::Dash;
use crate::style::{Color, CrosswalkStyle, LineStyle, StopLineStyle};
use crate::{Markup, MarkupConfig};

/// A continuous line, split into nearly straight quads.
pub fn solid(traj: &Trajectory, width: Distance, color: Color, config: &MarkupConfig) -> Vec<Dash> {
    traj.subdivide(
        config.solid_min_angle,
        config.solid_min_length,
        config.solid_max_length,
    )
    .into_iter()
    .filter_map(|piece| Dash::new(piece.start_pt(), piece.end_pt(), width, color))
    .collect()
}

/// Evenly spaced dashes, centered so both ends of the trajectory look the same.
pub fn dashed(
    traj: &Trajectory,
    dash_length: Distance,
    space_length: Distance,
    width: Distance,
    color: Color,
    config: &MarkupConfig,
) -> Vec<Dash> {
    let period = dash_length + space_length;
    if dash_length < config.min_dash_length || period <= Distance::ZERO {
        return Vec::new();
    }
    let total = traj.length();
    let count = ((total + space_length) / period).floor().max(0.0) as usize;
    if count == 0 {
        return Vec::new();
    }
    let used = period * count as f64 - space_length;

    let mut result = Vec::new();
    let mut dist = (total - used) / 2.0;
    for _ in 0..count {
        let from = traj.t_at_distance(dist);
        let to = traj.t_at_distance(dist + dash_length);
        dist += period;
        let piece = skip_fail!(traj.cut(from, to));
        if piece.length() < config.min_dash_length {
            continue;
        }
        result.extend(Dash::new(piece.start_pt(), piece.end_pt(), width, color));
    }
    result
}

fn styled(traj: &Trajectory, style: &LineStyle, config: &MarkupConfig) -> Vec<Dash> {
    match *style {
        LineStyle::Solid { color, width } => solid(traj, width, color, config),
        LineStyle::Dashed {
            color,
            width,
            dash_length,
            space_length,
        } => dashed(traj, dash_length, space_length, width, color, config),
        LineStyle::DoubleSolid {
            color,
            width,
            offset,
        } => [-offset, offset]
            .iter()
            .flat_map(|shift| solid(&traj.shift(*shift), width, color, config))
            .collect(),
        LineStyle::DoubleDashed {
            color,
            width,
            dash_length,
            space_length,
            offset,
        } => [-offset, offset]
            .iter()
            .flat_map(|shift| {
                dashed(
                    &traj.shift(*shift),
                    dash_length,
                    space_length,
                    width,
                    color,
                    config,
                )
            })
            .collect(),
    }
}

/// Everything a line paints. Crosswalk lines are drawn by their crosswalk instead.
pub fn line_dashes(markup: &Markup, line: &MarkupLine) -> Vec<Dash> {
    let config = markup.config();
    match line.kind {
        LineKind::Regular { ref rules } => {
            let mut result = Vec::new();
            for rule in rules {
                let from = skip_fail!(markup.rule_edge_t(line, rule.from));
                let to = skip_fail!(markup.rule_edge_t(line, rule.to));
                if (from - to).abs() < EPSILON_T {
                    continue;
                }
                let piece = skip_fail!(line.trajectory().cut(from.min(to), from.max(to)));
                result.extend(styled(&piece, &rule.style, config));
            }
            result
        }
        LineKind::Stop { style } => match style {
            StopLineStyle::Solid { color, width } => {
                solid(line.trajectory(), width, color, config)
            }
            StopLineStyle::Dashed {
                color,
                width,
                dash_length,
                space_length,
            } => dashed(
                line.trajectory(),
                dash_length,
                space_length,
                width,
                color,
                config,
            ),
        },
        LineKind::Crosswalk => Vec::new(),
    }
}

/// Positive when shifting the trajectory to its right moves towards `target`.
fn side_towards(traj: &Trajectory, target: Pt2D) -> f64 {
    let middle = traj.position(0.5);
    let shifted = traj.shift(Distance::meters(1.0)).position(0.5);
    if shifted.raw_dist_to(target) < middle.raw_dist_to(target) {
        1.0
    } else {
        -1.0
    }
}

/// Cuts a band parallel to the crosswalk line where its border lines cross it.
fn clip_to_borders(markup: &Markup, crosswalk: &Crosswalk, band: &Trajectory) -> Option<Trajectory> {
    let mut from = 0.0;
    let mut to = 1.0;
    if let Some(border) = crosswalk.left_border().and_then(|l| markup.try_get_line(l)) {
        if let Some((t, _)) = band.first_intersection(border.trajectory()) {
            from = t;
        }
    }
    if let Some(border) = crosswalk.right_border().and_then(|l| markup.try_get_line(l)) {
        if let Some((t, _)) = band.first_intersection(border.trajectory()) {
            to = t;
        }
    }
    if to - from < EPSILON_T {
        return None;
    }
    band.cut(from, to)
}

pub fn crosswalk_dashes(markup: &Markup, crosswalk: &Crosswalk) -> Vec<Dash> {
    let config = markup.config();
    let line = match markup.try_get_line(crosswalk.line) {
        Some(line) => line,
        None => return Vec::new(),
    };
    let traj = line.trajectory();
    let inward = side_towards(traj, markup.position());

    match crosswalk.style {
        CrosswalkStyle::Existent { .. } => Vec::new(),
        CrosswalkStyle::Zebra {
            color,
            width,
            offset_before,
            dash_length,
            space_length,
        } => {
            let band = traj.shift((offset_before + width / 2.0) * inward);
            match clip_to_borders(markup, crosswalk, &band) {
                Some(band) => dashed(&band, dash_length, space_length, width, color, config),
                None => Vec::new(),
            }
        }
        CrosswalkStyle::DoubleSolid {
            color,
            width,
            offset_before,
            line_width,
        } => {
            let mut result = Vec::new();
            for shift in [
                offset_before + line_width / 2.0,
                offset_before + width - line_width / 2.0,
            ] {
                let band = skip_fail!(clip_to_borders(
                    markup,
                    crosswalk,
                    &traj.shift(shift * inward)
                ));
                result.extend(solid(&band, line_width, color, config));
            }
            result
        }
    }
}

/// Parallel stripes at `angle`, `step` apart, clipped to the inside of a simple polygon.
pub fn filler_stripes(
    outline: &[Pt2D],
    angle: Angle,
    step: Distance,
    width: Distance,
    color: Color,
) -> Vec<Dash> {
    if outline.len() < 3 || step <= Distance::ZERO {
        return Vec::new();
    }
    let (dx, dy) = angle.unit_vector();
    // Perpendicular to the stripes
    let (nx, ny) = (-dy, dx);

    let along: Vec<f64> = outline.iter().map(|pt| pt.x() * dx + pt.y() * dy).collect();
    let across: Vec<f64> = outline.iter().map(|pt| pt.x() * nx + pt.y() * ny).collect();
    let (min_along, max_along) = min_max(&along);
    let (min_across, max_across) = min_max(&across);
    let step = step.inner_meters();

    let edges: Vec<Line> = (0..outline.len())
        .filter_map(|idx| Line::new(outline[idx], outline[(idx + 1) % outline.len()]))
        .collect();

    let mut result = Vec::new();
    let mut offset = min_across + step / 2.0;
    while offset < max_across {
        let at = |s: f64| Pt2D::new(s * dx + offset * nx, s * dy + offset * ny);
        if let Some(stripe) = Line::new(at(min_along - 1.0), at(max_along + 1.0)) {
            let mut hits: Vec<f64> = edges
                .iter()
                .filter_map(|edge| stripe.intersection_t(edge).map(|(t, _)| t))
                .collect();
            hits.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            hits.dedup_by(|a, b| (*a - *b).abs() < EPSILON_T);
            for pair in hits.chunks_exact(2) {
                result.extend(Dash::new(
                    stripe.percent_along(pair[0]),
                    stripe.percent_along(pair[1]),
                    width,
                    color,
                ));
            }
        }
        offset += step;
    }
    result
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), x| (lo.min(*x), hi.max(*x)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashes_are_centered() {
        let config = MarkupConfig::default();
        let traj = Trajectory::straight(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0)).unwrap();
        let dashes = dashed(
            &traj,
            Distance::meters(2.0),
            Distance::meters(2.0),
            Distance::meters(0.1),
            Color::WHITE,
            &config,
        );
        // 2 on, 2 off: 3 dashes use 10 meters exactly
        assert_eq!(dashes.len(), 3);
        assert!(dashes[0]
            .line()
            .pt1()
            .approx_eq(Pt2D::new(0.0, 0.0), geom::EPSILON_DIST));
        assert!(dashes[2]
            .line()
            .pt2()
            .approx_eq(Pt2D::new(10.0, 0.0), geom::EPSILON_DIST));

        let tiny = dashed(
            &traj,
            Distance::meters(0.01),
            Distance::meters(1.0),
            Distance::meters(0.1),
            Color::WHITE,
            &config,
        );
        assert!(tiny.is_empty());
    }

    #[test]
    fn stripes_stay_inside() {
        let square = vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(0.0, 10.0),
            Pt2D::new(10.0, 10.0),
            Pt2D::new(10.0, 0.0),
        ];
        let stripes = filler_stripes(
            &square,
            Angle::degrees(0.0),
            Distance::meters(1.0),
            Distance::meters(0.1),
            Color::WHITE,
        );
        assert_eq!(stripes.len(), 10);
        for dash in stripes {
            assert!((dash.length().inner_meters() - 10.0).abs() < 0.01);
        }
    }
}
