//! Quantized normals: one byte indexing a fixed table of directions.
//!
//! The table is in engine space and must match the runtime's copy entry for
//! entry; files store only the index.

use glam::Vec3;

/// Direction table shared with the runtime
pub const NORMAL_TABLE: [Vec3; 198] = [
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(0.0, 0.0, -1.0),
    Vec3::new(0.2225, 0.0, 0.97490001),
    Vec3::new(0.4339, 0.0, 0.90100002),
    Vec3::new(0.62349999, 0.0, 0.78179997),
    Vec3::new(0.78179997, 0.0, 0.62349999),
    Vec3::new(0.90100002, 0.0, 0.4339),
    Vec3::new(0.97490001, 0.0, 0.2225),
    Vec3::new(0.0, 0.2225, 0.97490001),
    Vec3::new(0.0, 0.4339, 0.90100002),
    Vec3::new(0.0, 0.62349999, 0.78179997),
    Vec3::new(0.0, 0.78179997, 0.62349999),
    Vec3::new(0.0, 0.90100002, 0.4339),
    Vec3::new(0.0, 0.97490001, 0.2225),
    Vec3::new(-0.2225, 0.0, 0.97490001),
    Vec3::new(-0.4339, 0.0, 0.90100002),
    Vec3::new(-0.62349999, 0.0, 0.78179997),
    Vec3::new(-0.78179997, 0.0, 0.62349999),
    Vec3::new(-0.90100002, 0.0, 0.4339),
    Vec3::new(-0.97490001, 0.0, 0.2225),
    Vec3::new(0.0, -0.2225, 0.97490001),
    Vec3::new(0.0, -0.4339, 0.90100002),
    Vec3::new(0.0, -0.62349999, 0.78179997),
    Vec3::new(0.0, -0.78179997, 0.62349999),
    Vec3::new(0.0, -0.90100002, 0.4339),
    Vec3::new(0.0, -0.97490001, 0.2225),
    Vec3::new(0.2225, 0.0, -0.97490001),
    Vec3::new(0.4339, 0.0, -0.90100002),
    Vec3::new(0.62349999, 0.0, -0.78179997),
    Vec3::new(0.78179997, 0.0, -0.62349999),
    Vec3::new(0.90100002, 0.0, -0.4339),
    Vec3::new(0.97490001, 0.0, -0.2225),
    Vec3::new(0.0, 0.2225, -0.97490001),
    Vec3::new(0.0, 0.4339, -0.90100002),
    Vec3::new(0.0, 0.62349999, -0.78179997),
    Vec3::new(0.0, 0.78179997, -0.62349999),
    Vec3::new(0.0, 0.90100002, -0.4339),
    Vec3::new(0.0, 0.97490001, -0.2225),
    Vec3::new(-0.2225, 0.0, -0.97490001),
    Vec3::new(-0.4339, 0.0, -0.90100002),
    Vec3::new(-0.62349999, 0.0, -0.78179997),
    Vec3::new(-0.78179997, 0.0, -0.62349999),
    Vec3::new(-0.90100002, 0.0, -0.4339),
    Vec3::new(-0.97490001, 0.0, -0.2225),
    Vec3::new(0.0, -0.2225, -0.97490001),
    Vec3::new(0.0, -0.4339, -0.90100002),
    Vec3::new(0.0, -0.62349999, -0.78179997),
    Vec3::new(0.0, -0.78179997, -0.62349999),
    Vec3::new(0.0, -0.90100002, -0.4339),
    Vec3::new(0.0, -0.97490001, -0.2225),
    Vec3::new(0.97490001, 0.2225, 0.0),
    Vec3::new(0.90100002, 0.4339, 0.0),
    Vec3::new(0.78179997, 0.62349999, 0.0),
    Vec3::new(0.62349999, 0.78179997, 0.0),
    Vec3::new(0.4339, 0.90100002, 0.0),
    Vec3::new(0.2225, 0.97490001, 0.0),
    Vec3::new(-0.2225, 0.97490001, 0.0),
    Vec3::new(-0.4339, 0.90100002, 0.0),
    Vec3::new(-0.62349999, 0.78179997, 0.0),
    Vec3::new(-0.78179997, 0.62349999, 0.0),
    Vec3::new(-0.90100002, 0.4339, 0.0),
    Vec3::new(-0.97490001, 0.2225, 0.0),
    Vec3::new(-0.97490001, -0.2225, 0.0),
    Vec3::new(-0.90100002, -0.4339, 0.0),
    Vec3::new(-0.78179997, -0.62349999, 0.0),
    Vec3::new(-0.62349999, -0.78179997, 0.0),
    Vec3::new(-0.4339, -0.90100002, 0.0),
    Vec3::new(-0.2225, -0.97490001, 0.0),
    Vec3::new(0.2225, -0.97490001, 0.0),
    Vec3::new(0.4339, -0.90100002, 0.0),
    Vec3::new(0.62349999, -0.78179997, 0.0),
    Vec3::new(0.78179997, -0.62349999, 0.0),
    Vec3::new(0.90100002, -0.4339, 0.0),
    Vec3::new(0.97490001, -0.2225, 0.0),
    Vec3::new(0.2279, 0.2279, 0.94660002),
    Vec3::new(0.45050001, 0.2361, 0.861),
    Vec3::new(0.2361, 0.45050001, 0.861),
    Vec3::new(0.65329999, 0.245, 0.71640003),
    Vec3::new(0.4691, 0.4691, 0.7482),
    Vec3::new(0.245, 0.65329999, 0.71640003),
    Vec3::new(0.8197, 0.2502, 0.51529998),
    Vec3::new(0.67619997, 0.4815, 0.5575),
    Vec3::new(0.4815, 0.67619997, 0.5575),
    Vec3::new(0.2502, 0.8197, 0.51529998),
    Vec3::new(0.93159997, 0.2448, 0.2685),
    Vec3::new(0.82880002, 0.47400001, 0.2974),
    Vec3::new(0.67290002, 0.67290002, 0.30720001),
    Vec3::new(0.47400001, 0.82880002, 0.2974),
    Vec3::new(0.2448, 0.93159997, 0.2685),
    Vec3::new(-0.2279, 0.2279, 0.94660002),
    Vec3::new(-0.2361, 0.45050001, 0.861),
    Vec3::new(-0.45050001, 0.2361, 0.861),
    Vec3::new(-0.245, 0.65329999, 0.71640003),
    Vec3::new(-0.4691, 0.4691, 0.7482),
    Vec3::new(-0.65329999, 0.245, 0.71640003),
    Vec3::new(-0.2502, 0.8197, 0.51529998),
    Vec3::new(-0.4815, 0.67619997, 0.5575),
    Vec3::new(-0.67619997, 0.4815, 0.5575),
    Vec3::new(-0.8197, 0.2502, 0.51529998),
    Vec3::new(-0.2448, 0.93159997, 0.2685),
    Vec3::new(-0.47400001, 0.82880002, 0.2974),
    Vec3::new(-0.67290002, 0.67290002, 0.30720001),
    Vec3::new(-0.82880002, 0.47400001, 0.2974),
    Vec3::new(-0.93159997, 0.2448, 0.2685),
    Vec3::new(-0.2279, -0.2279, 0.94660002),
    Vec3::new(-0.45050001, -0.2361, 0.861),
    Vec3::new(-0.2361, -0.45050001, 0.861),
    Vec3::new(-0.65329999, -0.245, 0.71640003),
    Vec3::new(-0.4691, -0.4691, 0.7482),
    Vec3::new(-0.245, -0.65329999, 0.71640003),
    Vec3::new(-0.8197, -0.2502, 0.51529998),
    Vec3::new(-0.67619997, -0.4815, 0.5575),
    Vec3::new(-0.4815, -0.67619997, 0.5575),
    Vec3::new(-0.2502, -0.8197, 0.51529998),
    Vec3::new(-0.93159997, -0.2448, 0.2685),
    Vec3::new(-0.82880002, -0.47400001, 0.2974),
    Vec3::new(-0.67290002, -0.67290002, 0.30720001),
    Vec3::new(-0.47400001, -0.82880002, 0.2974),
    Vec3::new(-0.2448, -0.93159997, 0.2685),
    Vec3::new(0.2279, -0.2279, 0.94660002),
    Vec3::new(0.2361, -0.45050001, 0.861),
    Vec3::new(0.45050001, -0.2361, 0.861),
    Vec3::new(0.245, -0.65329999, 0.71640003),
    Vec3::new(0.4691, -0.4691, 0.7482),
    Vec3::new(0.65329999, -0.245, 0.71640003),
    Vec3::new(0.2502, -0.8197, 0.51529998),
    Vec3::new(0.4815, -0.67619997, 0.5575),
    Vec3::new(0.67619997, -0.4815, 0.5575),
    Vec3::new(0.8197, -0.2502, 0.51529998),
    Vec3::new(0.2448, -0.93159997, 0.2685),
    Vec3::new(0.47400001, -0.82880002, 0.2974),
    Vec3::new(0.67290002, -0.67290002, 0.30720001),
    Vec3::new(0.82880002, -0.47400001, 0.2974),
    Vec3::new(0.93159997, -0.2448, 0.2685),
    Vec3::new(0.2279, 0.2279, -0.94660002),
    Vec3::new(0.2361, 0.45050001, -0.861),
    Vec3::new(0.45050001, 0.2361, -0.861),
    Vec3::new(0.245, 0.65329999, -0.71640003),
    Vec3::new(0.4691, 0.4691, -0.7482),
    Vec3::new(0.65329999, 0.245, -0.71640003),
    Vec3::new(0.2502, 0.8197, -0.51529998),
    Vec3::new(0.4815, 0.67619997, -0.5575),
    Vec3::new(0.67619997, 0.4815, -0.5575),
    Vec3::new(0.8197, 0.2502, -0.51529998),
    Vec3::new(0.2448, 0.93159997, -0.2685),
    Vec3::new(0.47400001, 0.82880002, -0.2974),
    Vec3::new(0.67290002, 0.67290002, -0.30720001),
    Vec3::new(0.82880002, 0.47400001, -0.2974),
    Vec3::new(0.93159997, 0.2448, -0.2685),
    Vec3::new(-0.2279, 0.2279, -0.94660002),
    Vec3::new(-0.45050001, 0.2361, -0.861),
    Vec3::new(-0.2361, 0.45050001, -0.861),
    Vec3::new(-0.65329999, 0.245, -0.71640003),
    Vec3::new(-0.4691, 0.4691, -0.7482),
    Vec3::new(-0.245, 0.65329999, -0.71640003),
    Vec3::new(-0.8197, 0.2502, -0.51529998),
    Vec3::new(-0.67619997, 0.4815, -0.5575),
    Vec3::new(-0.4815, 0.67619997, -0.5575),
    Vec3::new(-0.2502, 0.8197, -0.51529998),
    Vec3::new(-0.93159997, 0.2448, -0.2685),
    Vec3::new(-0.82880002, 0.47400001, -0.2974),
    Vec3::new(-0.67290002, 0.67290002, -0.30720001),
    Vec3::new(-0.47400001, 0.82880002, -0.2974),
    Vec3::new(-0.2448, 0.93159997, -0.2685),
    Vec3::new(-0.2279, -0.2279, -0.94660002),
    Vec3::new(-0.2361, -0.45050001, -0.861),
    Vec3::new(-0.45050001, -0.2361, -0.861),
    Vec3::new(-0.245, -0.65329999, -0.71640003),
    Vec3::new(-0.4691, -0.4691, -0.7482),
    Vec3::new(-0.65329999, -0.245, -0.71640003),
    Vec3::new(-0.2502, -0.8197, -0.51529998),
    Vec3::new(-0.4815, -0.67619997, -0.5575),
    Vec3::new(-0.67619997, -0.4815, -0.5575),
    Vec3::new(-0.8197, -0.2502, -0.51529998),
    Vec3::new(-0.2448, -0.93159997, -0.2685),
    Vec3::new(-0.47400001, -0.82880002, -0.2974),
    Vec3::new(-0.67290002, -0.67290002, -0.30720001),
    Vec3::new(-0.82880002, -0.47400001, -0.2974),
    Vec3::new(-0.93159997, -0.2448, -0.2685),
    Vec3::new(0.2279, -0.2279, -0.94660002),
    Vec3::new(0.45050001, -0.2361, -0.861),
    Vec3::new(0.2361, -0.45050001, -0.861),
    Vec3::new(0.65329999, -0.245, -0.71640003),
    Vec3::new(0.4691, -0.4691, -0.7482),
    Vec3::new(0.245, -0.65329999, -0.71640003),
    Vec3::new(0.8197, -0.2502, -0.51529998),
    Vec3::new(0.67619997, -0.4815, -0.5575),
    Vec3::new(0.4815, -0.67619997, -0.5575),
    Vec3::new(0.2502, -0.8197, -0.51529998),
    Vec3::new(0.93159997, -0.2448, -0.2685),
    Vec3::new(0.82880002, -0.47400001, -0.2974),
    Vec3::new(0.67290002, -0.67290002, -0.30720001),
    Vec3::new(0.47400001, -0.82880002, -0.2974),
    Vec3::new(0.2448, -0.93159997, -0.2685),
];

/// Index of the closest table direction.
///
/// Near-axis normals take the fixed slots of `+Y`, `+X` and `+Z`. Other
/// normals pick the nearest entry by squared distance among entries that do
/// not point away from the input; the first of equally close entries wins.
pub fn pack_normal(normal: Vec3) -> u8 {
    if normal == Vec3::ZERO {
        return 0;
    }
    if normal.y > 0.99 {
        return 2;
    }
    if normal.x > 0.99 {
        return 1;
    }
    if normal.z > 0.99 {
        return 0;
    }

    // compared in double precision
    let normal = normal.as_dvec3();
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (index, candidate) in NORMAL_TABLE.iter().enumerate() {
        let candidate = candidate.as_dvec3();
        if normal.dot(candidate) < 0.0 {
            continue;
        }
        let distance = normal.distance_squared(candidate);
        if distance < best_distance {
            best_distance = distance;
            best = index;
        }
    }
    best as u8
}

/// Direction for a stored index, `None` past the end of the table
pub fn unpack_normal(index: u8) -> Option<Vec3> {
    NORMAL_TABLE.get(index as usize).copied()
}
