// src/hex.rs
//! Математика гексагональной сетки (flat-top)
//!
//! Основная система координат — осевая `(q, r)`. Для формул расстояния и
//! линий используется кубическая `(x, y, z)` с инвариантом `x + y + z = 0`,
//! а для прямоугольных границ карты — смещённая `(col, row)` со сдвигом
//! нечётных столбцов вниз (odd-q).
//!
//! Все функции чистые и тотальные: проверка попадания в карту — забота
//! вызывающей стороны (см. [`crate::grid::WorldGrid::is_valid`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

const SQRT_3: f32 = 1.732_050_8;

/// Осевая координата гекса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct AxialCoord {
    pub q: i32,
    pub r: i32,
}

/// Кубическая координата, `x + y + z = 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubeCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Смещённая координата (odd-q): столбец и строка прямоугольной карты
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OffsetCoord {
    pub col: i32,
    pub row: i32,
}

/// Шесть единичных направлений: E, NE, NW, W, SW, SE.
///
/// Направления `i` и `(i + 3) % 6` противоположны.
pub const DIRECTIONS: [AxialCoord; 6] = [
    AxialCoord { q: 1, r: 0 },  // E
    AxialCoord { q: 1, r: -1 }, // NE
    AxialCoord { q: 0, r: -1 }, // NW
    AxialCoord { q: -1, r: 0 }, // W
    AxialCoord { q: -1, r: 1 }, // SW
    AxialCoord { q: 0, r: 1 },  // SE
];

impl AxialCoord {
    /// Нулевой вектор: «нет направления» / устье реки
    pub const ZERO: Self = Self { q: 0, r: 0 };

    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.q == 0 && self.r == 0
    }

    #[must_use]
    pub const fn to_cube(self) -> CubeCoord {
        CubeCoord {
            x: self.q,
            y: -self.q - self.r,
            z: self.r,
        }
    }

    #[must_use]
    pub const fn to_offset(self) -> OffsetCoord {
        OffsetCoord {
            col: self.q,
            row: self.r + (self.q - (self.q & 1)) / 2,
        }
    }

    /// Центр гекса в пикселях для размера `size` (радиус описанной окружности)
    #[must_use]
    pub fn to_pixel(self, size: f32) -> (f32, f32) {
        let x = size * 1.5 * self.q as f32;
        let y = size * SQRT_3 * (self.r as f32 + self.q as f32 / 2.0);
        (x, y)
    }

    /// Гекс, содержащий точку `(x, y)`
    #[must_use]
    pub fn from_pixel(x: f32, y: f32, size: f32) -> Self {
        let q = (2.0 / 3.0 * x) / size;
        let r = (-1.0 / 3.0 * x + SQRT_3 / 3.0 * y) / size;
        cube_round(f64::from(q), f64::from(-q - r), f64::from(r)).to_axial()
    }

    /// Сосед в направлении `direction` (берётся по модулю 6)
    #[must_use]
    pub fn neighbor(self, direction: usize) -> Self {
        self + DIRECTIONS[direction % 6]
    }

    #[must_use]
    pub fn neighbors(self) -> [Self; 6] {
        DIRECTIONS.map(|d| self + d)
    }

    /// Расстояние в шагах сетки: `(|Δx| + |Δy| + |Δz|) / 2`
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        let a = self.to_cube();
        let b = other.to_cube();
        ((a.x - b.x).unsigned_abs() + (a.y - b.y).unsigned_abs() + (a.z - b.z).unsigned_abs()) / 2
    }

    /// Индекс направления, если `other` — непосредственный сосед
    #[must_use]
    pub fn direction_to(self, other: Self) -> Option<usize> {
        let delta = other - self;
        DIRECTIONS.iter().position(|&d| d == delta)
    }
}

impl CubeCoord {
    #[must_use]
    pub const fn to_axial(self) -> AxialCoord {
        AxialCoord {
            q: self.x,
            r: self.z,
        }
    }
}

impl OffsetCoord {
    #[must_use]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    #[must_use]
    pub const fn to_axial(self) -> AxialCoord {
        AxialCoord {
            q: self.col,
            r: self.row - (self.col - (self.col & 1)) / 2,
        }
    }
}

impl From<CubeCoord> for AxialCoord {
    fn from(cube: CubeCoord) -> Self {
        cube.to_axial()
    }
}

impl From<AxialCoord> for CubeCoord {
    fn from(axial: AxialCoord) -> Self {
        axial.to_cube()
    }
}

impl From<OffsetCoord> for AxialCoord {
    fn from(offset: OffsetCoord) -> Self {
        offset.to_axial()
    }
}

impl From<AxialCoord> for OffsetCoord {
    fn from(axial: AxialCoord) -> Self {
        axial.to_offset()
    }
}

impl Add for AxialCoord {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            q: self.q + other.q,
            r: self.r + other.r,
        }
    }
}

impl Sub for AxialCoord {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            q: self.q - other.q,
            r: self.r - other.r,
        }
    }
}

impl Neg for AxialCoord {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            q: -self.q,
            r: -self.r,
        }
    }
}

impl Mul<i32> for AxialCoord {
    type Output = Self;

    #[inline]
    fn mul(self, k: i32) -> Self {
        Self {
            q: self.q * k,
            r: self.r * k,
        }
    }
}

impl fmt::Display for AxialCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Все гексы на расстоянии `<= radius` от центра (включая центр)
#[must_use]
pub fn hexes_in_range(center: AxialCoord, radius: u32) -> Vec<AxialCoord> {
    let n = radius as i32;
    let mut result = Vec::with_capacity((3 * radius * (radius + 1) + 1) as usize);
    for dq in -n..=n {
        let r_min = (-n).max(-dq - n);
        let r_max = n.min(-dq + n);
        for dr in r_min..=r_max {
            result.push(center + AxialCoord::new(dq, dr));
        }
    }
    result
}

/// Кольцо гексов ровно на расстоянии `radius`
#[must_use]
pub fn hex_ring(center: AxialCoord, radius: u32) -> Vec<AxialCoord> {
    if radius == 0 {
        return vec![center];
    }
    let mut result = Vec::with_capacity(6 * radius as usize);
    // Начинаем с юго-западного угла и обходим кольцо против часовой стрелки
    let mut hex = center + DIRECTIONS[4] * radius as i32;
    for direction in 0..6 {
        for _ in 0..radius {
            result.push(hex);
            hex = hex.neighbor(direction);
        }
    }
    result
}

/// Прямая от `a` до `b` включительно (интерполяция в кубическом пространстве)
#[must_use]
pub fn line(a: AxialCoord, b: AxialCoord) -> Vec<AxialCoord> {
    let n = a.distance(b);
    if n == 0 {
        return vec![a];
    }
    let ca = a.to_cube();
    let cb = b.to_cube();
    // Сдвиг концов, чтобы точка не попадала ровно на ребро между гексами
    let (ax, ay, az) = (
        f64::from(ca.x) + 1e-6,
        f64::from(ca.y) + 1e-6,
        f64::from(ca.z) - 2e-6,
    );
    let (bx, by, bz) = (
        f64::from(cb.x) + 1e-6,
        f64::from(cb.y) + 1e-6,
        f64::from(cb.z) - 2e-6,
    );

    (0..=n)
        .map(|i| {
            let t = f64::from(i) / f64::from(n);
            cube_round(lerp(ax, bx, t), lerp(ay, by, t), lerp(az, bz, t)).to_axial()
        })
        .collect()
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Округление дробной кубической координаты до ближайшего гекса.
///
/// Компонента с наибольшей ошибкой округления пересчитывается из двух
/// других, чтобы сохранить `x + y + z = 0`.
#[must_use]
pub fn cube_round(x: f64, y: f64, z: f64) -> CubeCoord {
    let mut rx = x.round();
    let mut ry = y.round();
    let mut rz = z.round();

    let dx = (rx - x).abs();
    let dy = (ry - y).abs();
    let dz = (rz - z).abs();

    if dx > dy && dx > dz {
        rx = -ry - rz;
    } else if dy > dz {
        ry = -rx - rz;
    } else {
        rz = -rx - ry;
    }

    CubeCoord {
        x: rx as i32,
        y: ry as i32,
        z: rz as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn h(q: i32, r: i32) -> AxialCoord {
        AxialCoord::new(q, r)
    }

    #[test]
    fn neighbors_are_at_distance_one() {
        let center = h(3, -2);
        for n in center.neighbors() {
            assert_eq!(center.distance(n), 1);
        }
    }

    #[test]
    fn opposite_directions_cancel() {
        for i in 0..3 {
            assert_eq!(DIRECTIONS[i] + DIRECTIONS[i + 3], AxialCoord::ZERO);
        }
    }

    #[test]
    fn direction_to_finds_neighbor() {
        let c = h(1, 1);
        assert_eq!(c.direction_to(h(2, 1)), Some(0));
        assert_eq!(c.direction_to(h(1, 2)), Some(5));
        assert_eq!(c.direction_to(h(3, 1)), None);
    }

    #[test]
    fn odd_columns_shift_down() {
        // Столбец 1 нечётный: строка 0 лежит на r = 0, столбец 2 — на r = -1
        assert_eq!(OffsetCoord::new(1, 0).to_axial(), h(1, 0));
        assert_eq!(OffsetCoord::new(2, 0).to_axial(), h(2, -1));
        assert_eq!(OffsetCoord::new(3, 2).to_axial(), h(3, 1));
    }

    #[test]
    fn range_sizes() {
        assert_eq!(hexes_in_range(h(0, 0), 0).len(), 1);
        assert_eq!(hexes_in_range(h(0, 0), 1).len(), 7);
        assert_eq!(hexes_in_range(h(5, 5), 2).len(), 19);
    }

    #[test]
    fn ring_cells_are_exactly_radius_away() {
        let center = h(-1, 4);
        let ring = hex_ring(center, 3);
        assert_eq!(ring.len(), 18);
        for hex in &ring {
            assert_eq!(center.distance(*hex), 3);
        }
        assert_eq!(hex_ring(center, 0), vec![center]);
    }

    #[test]
    fn line_is_contiguous() {
        let a = h(0, 0);
        let b = h(4, -1);
        let path = line(a, b);
        assert_eq!(path.len(), 5);
        assert_eq!(path.first(), Some(&a));
        assert_eq!(path.last(), Some(&b));
        for pair in path.windows(2) {
            assert_eq!(pair[0].distance(pair[1]), 1);
        }
    }

    #[test]
    fn pixel_round_trip_at_centers() {
        for hex in hexes_in_range(h(2, 2), 3) {
            let (x, y) = hex.to_pixel(10.0);
            assert_eq!(AxialCoord::from_pixel(x, y, 10.0), hex);
        }
    }

    proptest! {
        #[test]
        fn distance_is_metric(
            aq in -50i32..50, ar in -50i32..50,
            bq in -50i32..50, br in -50i32..50,
            cq in -50i32..50, cr in -50i32..50,
        ) {
            let (a, b, c) = (h(aq, ar), h(bq, br), h(cq, cr));
            prop_assert_eq!(a.distance(a), 0);
            prop_assert_eq!(a.distance(b), b.distance(a));
            prop_assert!(a.distance(b) <= a.distance(c) + c.distance(b));
        }

        #[test]
        fn offset_round_trip(col in -200i32..200, row in -200i32..200) {
            let offset = OffsetCoord::new(col, row);
            prop_assert_eq!(offset.to_axial().to_offset(), offset);
        }

        #[test]
        fn cube_invariant_holds(q in -500i32..500, r in -500i32..500) {
            let cube = h(q, r).to_cube();
            prop_assert_eq!(cube.x + cube.y + cube.z, 0);
            prop_assert_eq!(cube.to_axial(), h(q, r));
        }

        #[test]
        fn line_length_matches_distance(
            aq in -30i32..30, ar in -30i32..30,
            bq in -30i32..30, br in -30i32..30,
        ) {
            let (a, b) = (h(aq, ar), h(bq, br));
            let path = line(a, b);
            prop_assert_eq!(path.len() as u32, a.distance(b) + 1);
        }
    }
}
