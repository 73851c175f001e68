use geom::{
    Bezier, Distance, Line, Pt2D, Tessellation, Trajectory, Winding, EPSILON_DIST, EPSILON_T,
};

use crate::contour::FillerContour;
use crate::render::{filler_stripes, BatchKind, Mesh, RenderData};
use crate::style::{Color, Filler3D, FillerStyle, MaterialType};
use crate::{Markup, MarkupConfig};

// Control handles of this length (relative to the radius) make a cubic curve close to a circular
// arc.
const ARC_HANDLE: f64 = 0.55;

/// Corners flatter than this many degrees aren't rounded.
const STRAIGHT_CORNER_DEGS: f64 = 1.0;

/// Everything a filler draws.
pub fn filler_render(markup: &Markup, contour: &FillerContour, style: &FillerStyle) -> RenderData {
    let config = markup.config();
    match *style {
        FillerStyle::Stripe {
            color,
            width,
            step,
            angle,
        } => RenderData {
            dashes: filler_stripes(&flat_outline(markup, contour, config), angle, step, width, color),
            meshes: Vec::new(),
        },
        FillerStyle::Grid {
            color,
            width,
            step,
            angle,
        } => {
            let outline = flat_outline(markup, contour, config);
            let mut dashes = filler_stripes(&outline, angle, step, width, color);
            dashes.extend(filler_stripes(
                &outline,
                angle.rotate_degs(90.0),
                step,
                width,
                color,
            ));
            RenderData {
                dashes,
                meshes: Vec::new(),
            }
        }
        FillerStyle::Solid { color } => RenderData {
            dashes: Vec::new(),
            meshes: flat_mesh(&flat_outline(markup, contour, config), color, markup.height())
                .into_iter()
                .collect(),
        },
        FillerStyle::Raised { material, settings } => RenderData {
            dashes: Vec::new(),
            meshes: raised_meshes(markup, contour, material, &settings),
        },
    }
}

/// The outline's sides, flattened into a polygon.
fn flat_outline(markup: &Markup, contour: &FillerContour, config: &MarkupConfig) -> Vec<Pt2D> {
    let mut pts = Vec::new();
    for traj in contour.trajectories_processed(markup).into_iter().flatten() {
        for piece in traj.subdivide(
            config.filler_min_angle,
            config.filler_min_length,
            config.filler_max_length,
        ) {
            pts.push(piece.start_pt());
        }
    }
    pts
}

/// A flat painted polygon.
pub fn flat_mesh(outline: &[Pt2D], color: Color, height: Distance) -> Option<Mesh> {
    let tess = match Tessellation::from_ring(outline.to_vec()) {
        Ok(tess) => tess.with_winding(Winding::Clockwise),
        Err(err) => {
            warn!("Can't fill a polygon: {}", err);
            return None;
        }
    };
    let z = height.inner_meters() as f32;
    let (points, indices) = tess.consume();
    Some(Mesh {
        kind: BatchKind::Paint(color),
        vertices: points
            .into_iter()
            .map(|pt| [pt.x() as f32, pt.y() as f32, z])
            .collect(),
        indices,
    })
}

/// A raised surface: the top, plus the skirt down to the node's height.
pub fn raised_meshes(
    markup: &Markup,
    contour: &FillerContour,
    material: MaterialType,
    settings: &Filler3D,
) -> Vec<Mesh> {
    let config = markup.config();
    let mut sides: Vec<(Trajectory, bool)> = contour
        .processed_parts()
        .iter()
        .filter_map(|part| part.trajectory(markup).map(|t| (t, part.is_enter())))
        .collect();
    if sides.len() < 3 {
        return Vec::new();
    }
    let trajectories: Vec<Trajectory> = sides.iter().map(|(t, _)| *t).collect();
    if Winding::of(&trajectories) == Winding::CounterClockwise {
        sides = sides
            .into_iter()
            .rev()
            .map(|(t, is_enter)| (t.reversed(), is_enter))
            .collect();
    }

    let median_radius = enter_corner_radius(markup, contour, settings);
    let rounded = round_corners(&sides, settings.corner_radius, median_radius);

    let mut groups: Vec<Vec<Line>> = rounded
        .iter()
        .map(|traj| {
            traj.subdivide(
                config.filler_min_angle,
                config.filler_min_length,
                config.filler_max_length,
            )
            .into_iter()
            .filter_map(|piece| piece.chord())
            .collect::<Vec<_>>()
        })
        .filter(|group: &Vec<Line>| !group.is_empty())
        .collect();
    repair_self_intersections(&mut groups);

    let points: Vec<Pt2D> = groups.iter().flatten().map(|l| l.pt1()).collect();
    if points.len() < 3 {
        debug!("A raised filler collapsed to {} points", points.len());
        return Vec::new();
    }
    let tess = match Tessellation::from_ring(points.clone()) {
        Ok(tess) => tess.with_winding(Winding::Clockwise),
        Err(err) => {
            warn!("Can't triangulate a raised filler: {}", err);
            return Vec::new();
        }
    };

    let base = markup.height().inner_meters() as f32;
    let top = (markup.height() + settings.elevation).inner_meters() as f32;
    let mut result = Vec::new();

    let (tops, indices) = tess.consume();
    let mut surface = Mesh::surface(material);
    surface.vertices = tops
        .into_iter()
        .map(|pt| [pt.x() as f32, pt.y() as f32, top])
        .collect();
    surface.indices = indices;
    result.push(surface);

    if settings.elevation != Distance::ZERO && points.len() * 4 <= u16::MAX as usize {
        let mut skirt = Mesh::surface(MaterialType::Pavement);
        for idx in 0..points.len() {
            let a = points[idx];
            let b = points[(idx + 1) % points.len()];
            let first = skirt.vertices.len() as u16;
            skirt.vertices.push([a.x() as f32, a.y() as f32, base]);
            skirt.vertices.push([b.x() as f32, b.y() as f32, base]);
            skirt.vertices.push([b.x() as f32, b.y() as f32, top]);
            skirt.vertices.push([a.x() as f32, a.y() as f32, top]);
            skirt
                .indices
                .extend([first, first + 1, first + 2, first, first + 2, first + 3]);
        }
        result.push(skirt);
    }
    result
}

/// The radius for corners next to a side along an enter. Only medians use their own.
pub fn enter_corner_radius(
    markup: &Markup,
    contour: &FillerContour,
    settings: &Filler3D,
) -> Distance {
    if contour.is_median(markup) {
        settings.median_corner_radius
    } else {
        settings.corner_radius
    }
}

/// Replaces each corner of a closed outline with a curve of `radius`, shortening the sides
/// around it. Corners touching a side along an enter use `median_radius` instead. The radius
/// never exceeds half of either side's length.
pub fn round_corners(
    sides: &[(Trajectory, bool)],
    radius: Distance,
    median_radius: Distance,
) -> Vec<Trajectory> {
    let n = sides.len();
    if n < 2 {
        return sides.iter().map(|(t, _)| *t).collect();
    }
    let lengths: Vec<Distance> = sides.iter().map(|(t, _)| t.length()).collect();

    // Per corner after side i
    let mut corner = vec![Distance::ZERO; n];
    let mut trim_start = vec![Distance::ZERO; n];
    let mut trim_end = vec![Distance::ZERO; n];
    for idx in 0..n {
        let next = (idx + 1) % n;
        let requested = if sides[idx].1 || sides[next].1 {
            median_radius
        } else {
            radius
        };
        let r = requested
            .min(lengths[idx] / 2.0)
            .min(lengths[next] / 2.0);
        let straight = sides[idx]
            .0
            .end_dir()
            .approx_eq(sides[next].0.start_dir(), STRAIGHT_CORNER_DEGS);
        if r <= EPSILON_DIST || straight {
            continue;
        }
        corner[idx] = r;
        trim_end[idx] = r;
        trim_start[next] = r;
    }

    let mut result = Vec::new();
    for idx in 0..n {
        let traj = &sides[idx].0;
        let from = traj.t_at_distance(trim_start[idx]);
        let to = traj.t_at_distance(lengths[idx] - trim_end[idx]);
        if let Some(piece) = traj.cut(from, to) {
            result.push(piece);
        }

        let r = corner[idx];
        if r == Distance::ZERO {
            continue;
        }
        let next = &sides[(idx + 1) % n].0;
        let next_t = next.t_at_distance(r);
        let a = traj.position(to);
        let b = next.position(next_t);
        if a.approx_eq(b, EPSILON_DIST) {
            continue;
        }
        let handle = r * ARC_HANDLE;
        result.push(Trajectory::Curve(Bezier::new(
            a,
            a.project_away(handle, traj.tangent(to)),
            b.project_away(handle, next.tangent(next_t).opposite()),
            b,
        )));
    }
    result
}

/// Where two pieces properly cross, away from their endpoints.
fn crossing(a: &Line, b: &Line) -> Option<(f64, f64)> {
    let (t1, t2) = a.intersection_t(b)?;
    let interior = |t: f64| t > EPSILON_T && t < 1.0 - EPSILON_T;
    if interior(t1) && interior(t2) {
        Some((t1, t2))
    } else {
        None
    }
}

/// Looks for a piece of `a` crossing a piece of `b`, where `b` follows `a` along the outline if
/// `forwards`, or precedes it otherwise. `skip` pieces of `b` next to `a` are ignored. Both
/// groups are cut at the first crossing found, dropping what's beyond it.
fn trim_crossing(a: &mut Vec<Line>, b: &mut Vec<Line>, forwards: bool, skip: usize) -> bool {
    if forwards {
        for x in (0..a.len()).rev() {
            for y in skip..b.len() {
                if let Some((t1, t2)) = crossing(&a[x], &b[y]) {
                    let head = a[x].slice_pct(0.0, t1);
                    a.truncate(x);
                    a.extend(head);

                    let tail = b[y].slice_pct(t2, 1.0);
                    let rest: Vec<Line> = b.drain(y + 1..).collect();
                    b.clear();
                    b.extend(tail);
                    b.extend(rest);
                    return true;
                }
            }
        }
    } else {
        for x in 0..a.len() {
            for y in (0..b.len().saturating_sub(skip)).rev() {
                if let Some((t1, t2)) = crossing(&a[x], &b[y]) {
                    let tail = a[x].slice_pct(t1, 1.0);
                    let rest: Vec<Line> = a.drain(x + 1..).collect();
                    a.clear();
                    a.extend(tail);
                    a.extend(rest);

                    let head = b[y].slice_pct(0.0, t2);
                    b.truncate(y);
                    b.extend(head);
                    return true;
                }
            }
        }
    }
    false
}

fn two_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Removes the spikes that rounding produces in narrow or concave corners. Each group holds the
/// pieces of one side or corner, in order around the outline. Neighboring groups that cross get
/// trimmed at the crossing; a single-piece group squeezed out between two crossing neighbors is
/// dropped.
pub fn repair_self_intersections(groups: &mut Vec<Vec<Line>>) {
    let mut idx = 0;
    while idx < groups.len() {
        let n = groups.len();
        if n < 3 {
            return;
        }
        let prev = (idx + n - 1) % n;
        let x = idx;
        let y = (idx + 1) % n;
        let after = (idx + 2) % n;

        let (gx, gy) = two_mut(groups, x, y);
        if trim_crossing(gx, gy, true, 1) {
            groups.retain(|g| !g.is_empty());
            idx += 1;
            continue;
        }
        if n > 3 && groups[y].len() == 1 {
            let (gx, gafter) = two_mut(groups, x, after);
            if trim_crossing(gx, gafter, true, 0) {
                groups.remove(y);
                if y < x {
                    idx -= 1;
                }
                groups.retain(|g| !g.is_empty());
                idx += 1;
                continue;
            }
        }
        let (gy, gx) = two_mut(groups, y, x);
        if trim_crossing(gy, gx, false, 1) {
            groups.retain(|g| !g.is_empty());
            idx += 1;
            continue;
        }
        if n > 3 && groups[x].len() == 1 {
            let (gy, gprev) = two_mut(groups, y, prev);
            if trim_crossing(gy, gprev, false, 0) {
                groups.remove(x);
                groups.retain(|g| !g.is_empty());
                continue;
            }
        }
        idx += 1;
    }
}
