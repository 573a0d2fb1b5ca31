use crate::geometry::Position;

/// Two point entities touch when their centers are strictly closer than half
/// a cell.
pub fn is_colliding(a: Position, b: Position, cell_size: f32) -> bool {
    a.distance(&b) < cell_size / 2.0
}

/// Distance to a hazard when `a` is inside the warning radius but not yet in
/// contact with it.
pub fn proximity(a: Position, hazard: Position, cell_size: f32, radius: f32) -> Option<f32> {
    let dist = a.distance(&hazard);
    (dist > cell_size / 2.0 && dist <= radius).then_some(dist)
}

/// Whether `b` falls inside a circle of `radius` around `center` (inclusive).
pub fn within_radius(center: Position, b: Position, radius: f32) -> bool {
    center.distance(&b) <= radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_is_strict() {
        let a = Position::new(100.0, 100.0);
        assert!(is_colliding(a, Position::new(109.9, 100.0), 20.0));
        assert!(!is_colliding(a, Position::new(110.0, 100.0), 20.0));
        assert!(is_colliding(a, a, 20.0));
    }

    #[test]
    fn diagonal_distance_is_euclidean() {
        let a = Position::new(0.0, 0.0);
        // 7,7 is ~9.9 away: inside. 8,8 is ~11.3 away: outside.
        assert!(is_colliding(a, Position::new(7.0, 7.0), 20.0));
        assert!(!is_colliding(a, Position::new(8.0, 8.0), 20.0));
    }

    #[test]
    fn proximity_band_excludes_contact() {
        let trap = Position::new(200.0, 200.0);
        assert_eq!(proximity(Position::new(205.0, 200.0), trap, 20.0, 40.0), None);
        assert_eq!(
            proximity(Position::new(230.0, 200.0), trap, 20.0, 40.0),
            Some(30.0)
        );
        assert_eq!(
            proximity(Position::new(240.0, 200.0), trap, 20.0, 40.0),
            Some(40.0)
        );
        assert_eq!(proximity(Position::new(241.0, 200.0), trap, 20.0, 40.0), None);
    }

    #[test]
    fn radius_is_inclusive() {
        let c = Position::new(0.0, 0.0);
        assert!(within_radius(c, Position::new(100.0, 0.0), 100.0));
        assert!(!within_radius(c, Position::new(100.1, 0.0), 100.0));
    }
}
