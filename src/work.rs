//! Splitting an image into units of work for the render threads.
//!
//! A unit is a short list of pixel coordinates. The order pixels are handed
//! out in changes only *when* a pixel is traced, never its colour.

use std::fmt;
use std::str::FromStr;

use serde::{ Deserialize, Serialize };

use crate::error::Error;

/// A batch of pixels rendered by one worker in one go.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkUnit {
    pub pixels: Vec<(usize, usize)>,
}

impl WorkUnit {
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// The order pixels are visited in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkOrder {
    /// Row by row, left to right.
    #[default]
    Scanline,

    /// Along a Hilbert curve, which keeps each unit spatially compact.
    Hilbert,
}

impl fmt::Display for WorkOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WorkOrder::Scanline => write!(f, "scanline"),
            WorkOrder::Hilbert => write!(f, "hilbert"),
        }
    }
}

impl FromStr for WorkOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<WorkOrder, Error> {
        match s.to_ascii_lowercase().as_str() {
            "scanline" => Ok(WorkOrder::Scanline),
            "hilbert" => Ok(WorkOrder::Hilbert),
            other => Err(Error::Scene(format!("unknown work order {:?}", other))),
        }
    }
}

impl WorkOrder {
    /// Splits an `hsize` by `vsize` image into units of
    /// `max(1, hsize / threads)` pixels each (the last unit may be shorter).
    ///
    /// Every pixel lands in exactly one unit, and the result depends on
    /// nothing but the arguments.
    pub fn units(&self, hsize: usize, vsize: usize, threads: usize)
        -> Vec<WorkUnit> {
        let unit_size = (hsize / threads.max(1)).max(1);

        let order: Vec<(usize, usize)> = match self {
            WorkOrder::Scanline => (0..vsize)
                .flat_map(|y| (0..hsize).map(move |x| (x, y)))
                .collect(),
            WorkOrder::Hilbert => hilbert_order(hsize, vsize),
        };

        order.chunks(unit_size)
            .map(|chunk| WorkUnit { pixels: chunk.to_vec() })
            .collect()
    }
}

/// Every pixel of the image in Hilbert-curve order.
///
/// The curve covers the smallest power-of-two square holding the image;
/// points outside the image are skipped.
fn hilbert_order(hsize: usize, vsize: usize) -> Vec<(usize, usize)> {
    if hsize == 0 || vsize == 0 {
        return Vec::new();
    }

    let side = hsize.max(vsize).next_power_of_two();

    (0..side * side)
        .map(|d| hilbert_d2xy(side, d))
        .filter(|&(x, y)| x < hsize && y < vsize)
        .collect()
}

/// Maps distance `d` along the Hilbert curve filling an `n` by `n` square
/// (`n` a power of two) to its `(x, y)` cell.
fn hilbert_d2xy(n: usize, d: usize) -> (usize, usize) {
    let (mut x, mut y) = (0, 0);
    let mut t = d;
    let mut s = 1;

    while s < n {
        let rx = 1 & (t / 2);
        let ry = 1 & (t ^ rx);

        // Rotate the quadrant so the sub-curve joins up with its neighbours.
        if ry == 0 {
            if rx == 1 {
                x = s - 1 - x;
                y = s - 1 - y;
            }
            std::mem::swap(&mut x, &mut y);
        }

        x += s * rx;
        y += s * ry;
        t /= 4;
        s *= 2;
    }

    (x, y)
}

#[cfg(test)]
fn coverage(units: &[WorkUnit], hsize: usize, vsize: usize) -> Vec<usize> {
    let mut seen = vec![0; hsize * vsize];
    for unit in units {
        for &(x, y) in unit.pixels.iter() {
            seen[y * hsize + x] += 1;
        }
    }

    seen
}

#[test]
fn scanline_units_cover_image_once() {
    let units = WorkOrder::Scanline.units(10, 4, 3);

    // 10 / 3 rounds down to 3 pixels per unit.
    assert!(units.iter().all(|u| u.len() <= 3 && !u.is_empty()));
    assert_eq!(units.len(), 14);
    assert_eq!(units[0].pixels, vec![(0, 0), (1, 0), (2, 0)]);
    assert!(coverage(&units, 10, 4).iter().all(|&n| n == 1));
}

#[test]
fn unit_size_never_drops_to_zero() {
    let units = WorkOrder::Scanline.units(3, 2, 8);

    assert_eq!(units.len(), 6);
    assert!(units.iter().all(|u| u.len() == 1));

    let units = WorkOrder::Scanline.units(5, 5, 0);
    assert_eq!(units.len(), 5);
}

#[test]
fn hilbert_units_cover_image_once() {
    for &(w, h) in [(7, 5), (1, 1), (16, 16), (3, 12)].iter() {
        let units = WorkOrder::Hilbert.units(w, h, 4);
        assert!(coverage(&units, w, h).iter().all(|&n| n == 1), "{}x{}", w, h);
    }
}

#[test]
fn hilbert_steps_between_neighbours() {
    let path: Vec<(usize, usize)> = (0..64).map(|d| hilbert_d2xy(8, d)).collect();

    assert_eq!(path[0], (0, 0));
    for pair in path.windows(2) {
        let dx = (pair[0].0 as isize - pair[1].0 as isize).abs();
        let dy = (pair[0].1 as isize - pair[1].1 as isize).abs();
        assert_eq!(dx + dy, 1, "{:?}", pair);
    }
}

#[test]
fn units_are_deterministic() {
    assert_eq!(WorkOrder::Hilbert.units(33, 17, 6), WorkOrder::Hilbert.units(33, 17, 6));
    assert_eq!(WorkOrder::Scanline.units(33, 17, 6), WorkOrder::Scanline.units(33, 17, 6));
}

#[test]
fn empty_image_has_no_work() {
    assert!(WorkOrder::Scanline.units(0, 10, 4).is_empty());
    assert!(WorkOrder::Hilbert.units(10, 0, 4).is_empty());
}

#[test]
fn parsing_work_orders() {
    assert_eq!("hilbert".parse::<WorkOrder>().unwrap(), WorkOrder::Hilbert);
    assert_eq!("Scanline".parse::<WorkOrder>().unwrap(), WorkOrder::Scanline);
    assert!("spiral".parse::<WorkOrder>().is_err());
}
