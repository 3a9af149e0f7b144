//! Collision primitives: circle/circle, AABB/circle, and the two raycasts
//! used by weapons and the map's static resolution pass.

use crate::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionResult {
    pub colliding: bool,
    pub resolve: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RaycastResult {
    pub hit: bool,
    pub impact: Vec2,
    pub normal: Vec2,
    pub distance: f32,
}

/// Resolve vector points from `c0` toward separation, to be added to `c0`'s position.
pub fn circle_vs_circle(c0: Circle, c1: Circle) -> CollisionResult {
    let radius_sum = c0.radius + c1.radius;
    let center_diff = c1.pos.sub(c0.pos);
    let center_diff_len_sq = center_diff.len_sq();

    if center_diff_len_sq > radius_sum * radius_sum {
        return CollisionResult::default();
    }

    let center_diff_len = center_diff_len_sq.sqrt();
    if center_diff_len <= f32::EPSILON {
        // Degenerate: identical centers. Push along an arbitrary axis.
        return CollisionResult {
            colliding: true,
            resolve: Vec2::new(-radius_sum, 0.0),
        };
    }
    let overlap = radius_sum - center_diff_len;

    CollisionResult {
        colliding: true,
        resolve: center_diff.scale(overlap / center_diff_len).neg(),
    }
}

/// Resolve vector to add to the circle's position to push it out of the AABB.
pub fn aabb_vs_circle(aabb: Aabb, circle: Circle) -> CollisionResult {
    let nearest = Vec2::new(
        circle.pos.x.clamp(aabb.pos.x, aabb.pos.x + aabb.width),
        circle.pos.y.clamp(aabb.pos.y, aabb.pos.y + aabb.height),
    );
    let nearest_to_circle = nearest.sub(circle.pos);
    let dist_sq = nearest_to_circle.len_sq();

    if circle.radius * circle.radius < dist_sq {
        return CollisionResult::default();
    }

    let dist = dist_sq.sqrt();
    if dist <= f32::EPSILON {
        return CollisionResult::default();
    }
    CollisionResult {
        colliding: true,
        resolve: nearest_to_circle.scale(-(circle.radius - dist) / dist),
    }
}

/// `dir` must be a unit vector.
pub fn ray_vs_circle(pos: Vec2, dir: Vec2, circle: Circle) -> RaycastResult {
    let m = pos.sub(circle.pos);
    let c = m.len_sq() - circle.radius * circle.radius;
    let b = m.dot(dir);
    let disc = b * b - c;
    if disc < 0.0 {
        return RaycastResult::default();
    }

    let t = -b - disc.sqrt();
    if t < 0.0 {
        return RaycastResult::default();
    }

    RaycastResult {
        hit: true,
        impact: pos.add(dir.scale(t)),
        normal: Vec2::ZERO,
        distance: t,
    }
}

/// `dir` must be a unit vector. Returns the nearer of the two axis-aligned
/// slab intersections that lies within the box's extent on the other axis.
pub fn ray_vs_aabb(pos: Vec2, dir: Vec2, aabb: Aabb) -> RaycastResult {
    let x0 = aabb.pos.x;
    let x1 = aabb.pos.x + aabb.width;
    let y0 = aabb.pos.y;
    let y1 = aabb.pos.y + aabb.height;

    let mut best: Option<(f32, Vec2, Vec2)> = None; // (distance, impact, normal)

    if dir.x.abs() > f32::EPSILON {
        for &x in &[x0, x1] {
            let t = (x - pos.x) / dir.x;
            if t < 0.0 {
                continue;
            }
            let y = pos.y + dir.y * t;
            if y < y0 - 1e-4 || y > y1 + 1e-4 {
                continue;
            }
            let normal = Vec2::new(if x == x0 { -1.0 } else { 1.0 }, 0.0);
            if best.map(|(d, _, _)| t < d).unwrap_or(true) {
                best = Some((t, Vec2::new(x, y), normal));
            }
        }
    }
    if dir.y.abs() > f32::EPSILON {
        for &y in &[y0, y1] {
            let t = (y - pos.y) / dir.y;
            if t < 0.0 {
                continue;
            }
            let x = pos.x + dir.x * t;
            if x < x0 - 1e-4 || x > x1 + 1e-4 {
                continue;
            }
            let normal = Vec2::new(0.0, if y == y0 { -1.0 } else { 1.0 });
            if best.map(|(d, _, _)| t < d).unwrap_or(true) {
                best = Some((t, Vec2::new(x, y), normal));
            }
        }
    }

    match best {
        Some((distance, impact, normal)) => RaycastResult {
            hit: true,
            impact,
            normal,
            distance,
        },
        None => RaycastResult::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn circles_overlapping_push_apart() {
        let c0 = Circle { pos: Vec2::new(0.0, 0.0), radius: 1.0 };
        let c1 = Circle { pos: Vec2::new(1.0, 0.0), radius: 1.0 };
        let res = circle_vs_circle(c0, c1);
        assert!(res.colliding);
        // c0 should be pushed in -x.
        assert!(res.resolve.x < 0.0);
    }

    #[test]
    fn circles_far_apart_do_not_collide() {
        let c0 = Circle { pos: Vec2::new(0.0, 0.0), radius: 1.0 };
        let c1 = Circle { pos: Vec2::new(10.0, 0.0), radius: 1.0 };
        assert!(!circle_vs_circle(c0, c1).colliding);
    }

    #[test]
    fn aabb_vs_circle_pushes_out_along_shortest_axis() {
        let aabb = Aabb { pos: Vec2::new(0.0, 0.0), width: 1.0, height: 1.0 };
        let circle = Circle { pos: Vec2::new(1.1, 0.5), radius: 0.25 };
        let res = aabb_vs_circle(aabb, circle);
        assert!(res.colliding);
        assert!(res.resolve.x > 0.0);
    }

    #[test]
    fn ray_vs_aabb_hits_nearest_face() {
        let aabb = Aabb { pos: Vec2::new(5.0, -1.0), width: 1.0, height: 2.0 };
        let res = ray_vs_aabb(Vec2::ZERO, Vec2::new(1.0, 0.0), aabb);
        assert!(res.hit);
        assert_approx_eq!(res.distance, 5.0);
        assert_approx_eq!(res.normal.x, -1.0);
    }

    #[test]
    fn ray_vs_aabb_misses_when_not_aligned() {
        let aabb = Aabb { pos: Vec2::new(5.0, 5.0), width: 1.0, height: 1.0 };
        let res = ray_vs_aabb(Vec2::ZERO, Vec2::new(1.0, 0.0), aabb);
        assert!(!res.hit);
    }

    #[test]
    fn ray_vs_circle_returns_nearest_intersection() {
        let circle = Circle { pos: Vec2::new(5.0, 0.0), radius: 1.0 };
        let res = ray_vs_circle(Vec2::ZERO, Vec2::new(1.0, 0.0), circle);
        assert!(res.hit);
        assert_approx_eq!(res.distance, 4.0);
    }
}
