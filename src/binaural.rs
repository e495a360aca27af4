//! Binaural rendering over HRIR datasets.

use super::buffer::BufferViewMut;
use super::directivity::DirectivityOps;
use super::fir::{DigitalFilter, FirFilter};
use super::math::modulo;
use super::point::Point;
use super::{Angle, Ear, HeadRefOrientation, Sample};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Kemar responses are 16-bit integers scaled to a sane amplitude.
const KEMAR_NORMALISING_VALUE: Sample = 30000.0;

const KEMAR_ELEVATIONS: [isize; 14] = [-40, -30, -20, -10, 0, 10, 20, 30, 40, 50, 60, 70, 80, 90];
const KEMAR_NUM_MEASUREMENTS: [usize; 14] = [56, 60, 72, 72, 72, 72, 72, 60, 56, 45, 36, 24, 12, 1];

const CIPIC_AZIMUTHS: [isize; 25] = [
    -80, -65, -55, -45, -40, -35, -30, -25, -20, -15, -10, -5, 0, 5, 10, 15, 20, 25, 30, 35, 40,
    45, 55, 65, 80,
];
const CIPIC_NUM_ELEVATIONS: usize = 50;

/// A two-dimensional grid of head-related impulse responses: elevation
/// bins, each with its own set of azimuth bins, one mono HRIR per ear
/// and bin. Read-only after load and shareable between receivers.
#[derive(Clone, Debug)]
pub struct HrirDatabase {
    // Degrees, ascending.
    elevations: Vec<Angle>,
    // Degrees per elevation bin.
    azimuths: Vec<Vec<Angle>>,
    left: Vec<Vec<Vec<Sample>>>,
    right: Vec<Vec<Vec<Sample>>>,
    // Kemar-style databases span the full circle and wrap; CIPIC-style
    // ones cover a bounded range and clamp.
    azimuth_wraps: bool,
}

impl HrirDatabase {
    pub fn new(
        elevations: Vec<Angle>,
        azimuths: Vec<Vec<Angle>>,
        left: Vec<Vec<Vec<Sample>>>,
        right: Vec<Vec<Vec<Sample>>>,
        azimuth_wraps: bool,
    ) -> Self {
        assert!(!elevations.is_empty(), "the database needs elevation bins");
        assert_eq!(elevations.len(), azimuths.len());
        assert_eq!(elevations.len(), left.len());
        assert_eq!(elevations.len(), right.len());
        for (bin, azimuth_bin) in azimuths.iter().enumerate() {
            assert!(
                !azimuth_bin.is_empty(),
                "every elevation bin needs at least one azimuth"
            );
            assert_eq!(azimuth_bin.len(), left[bin].len());
            assert_eq!(azimuth_bin.len(), right[bin].len());
        }
        Self {
            elevations,
            azimuths,
            left,
            right,
            azimuth_wraps,
        }
    }

    pub fn num_elevations(&self) -> usize {
        self.elevations.len()
    }

    pub fn num_azimuths(&self, elevation_index: usize) -> usize {
        self.azimuths[elevation_index].len()
    }

    /// The HRIR stored for the given ear and bins.
    pub fn hrir(&self, ear: Ear, elevation_index: usize, azimuth_index: usize) -> &[Sample] {
        match ear {
            Ear::Left => &self.left[elevation_index][azimuth_index],
            Ear::Right => &self.right[elevation_index][azimuth_index],
        }
    }

    /// Index of the elevation bin nearest to `elevation` degrees;
    /// out-of-range requests clamp to the first or last bin.
    pub fn nearest_elevation_index(&self, elevation: Angle) -> usize {
        let mut best = 0;
        let mut best_distance = Sample::INFINITY;
        for (index, bin) in self.elevations.iter().enumerate() {
            let distance = (bin - elevation).abs();
            if distance < best_distance {
                best_distance = distance;
                best = index;
            }
        }
        best
    }

    /// Index of the azimuth bin nearest to `azimuth` degrees within
    /// the given elevation bin, wrapping around the circle when the
    /// database does.
    pub fn nearest_azimuth_index(&self, elevation_index: usize, azimuth: Angle) -> usize {
        let bins = &self.azimuths[elevation_index];
        let mut best = 0;
        let mut best_distance = Sample::INFINITY;
        for (index, bin) in bins.iter().enumerate() {
            let distance = if self.azimuth_wraps {
                let d = modulo(bin - azimuth, 360.0);
                d.min(360.0 - d)
            } else {
                (bin - azimuth).abs()
            };
            if distance < best_distance {
                best_distance = distance;
                best = index;
            }
        }
        best
    }

    /// Pre-applies `filter` to every response in the database, for
    /// instance an inverse headphone response. The filter state is
    /// reset between responses.
    pub fn filter_all(&mut self, filter: &mut dyn DigitalFilter) {
        for database in [&mut self.left, &mut self.right] {
            for elevation in database.iter_mut() {
                for hrir in elevation.iter_mut() {
                    let input = hrir.clone();
                    filter.reset_state();
                    filter.process_block(&input, hrir);
                }
            }
        }
        filter.reset_state();
    }
}

/// A loader producing the (elevation bin, azimuth bin) HRIR grid. The
/// shipped implementations read the Kemar and CIPIC distributions; a
/// SOFA-backed loader plugs in through the same trait by adapting its
/// measurement positions onto a grid.
pub trait HrirLoader {
    fn load(&self) -> io::Result<HrirDatabase>;
}

/// Loader for the MIT Kemar compact distribution: one directory per
/// elevation with big-endian 16-bit stereo `.dat` responses for the
/// azimuths of the frontal half plane; the other half follows by
/// swapping the ears.
pub struct KemarLoader {
    directory: PathBuf,
}

impl KemarLoader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn load_ear(&self, ear: Ear) -> io::Result<Vec<Vec<Vec<Sample>>>> {
        let mut database = Vec::with_capacity(KEMAR_ELEVATIONS.len());
        for (i, elevation) in KEMAR_ELEVATIONS.iter().enumerate() {
            let count = KEMAR_NUM_MEASUREMENTS[i];
            let mut bin = vec![Vec::new(); count];
            let resolution = 360.0 / count as Angle;
            let num_files = count / 2 + 1;
            for j in 0..num_files {
                let angle = (j as Angle * resolution).round() as isize;
                let path = self
                    .directory
                    .join(format!("elev{elevation}"))
                    .join(format!("H{elevation}e{angle:03}a.dat"));
                let raw = fs::read(&path).map_err(|e| {
                    io::Error::new(
                        e.kind(),
                        format!("Kemar dataset not found at {}: {e}", path.display()),
                    )
                })?;
                if raw.len() % 4 != 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Kemar file {} is not 16-bit stereo", path.display()),
                    ));
                }
                let ipsilateral = j;
                let contralateral = (count - j) % count;
                for frame in raw.chunks_exact(4) {
                    let first = i16::from_be_bytes([frame[0], frame[1]]) as Sample
                        / KEMAR_NORMALISING_VALUE;
                    let second = i16::from_be_bytes([frame[2], frame[3]]) as Sample
                        / KEMAR_NORMALISING_VALUE;
                    // The two channels are the ears nearer to and
                    // further from the measured azimuth; mirroring
                    // them fills the other half circle.
                    let (ipsi_sample, contra_sample) = match ear {
                        Ear::Right => (first, second),
                        Ear::Left => (second, first),
                    };
                    bin[ipsilateral].push(ipsi_sample);
                    if ipsilateral != contralateral {
                        bin[contralateral].push(contra_sample);
                    }
                }
            }
            database.push(bin);
        }
        Ok(database)
    }
}

impl HrirLoader for KemarLoader {
    fn load(&self) -> io::Result<HrirDatabase> {
        let right = self.load_ear(Ear::Right)?;
        let left = self.load_ear(Ear::Left)?;
        let elevations: Vec<Angle> = KEMAR_ELEVATIONS.iter().map(|e| *e as Angle).collect();
        let azimuths: Vec<Vec<Angle>> = KEMAR_NUM_MEASUREMENTS
            .iter()
            .map(|count| {
                (0..*count)
                    .map(|j| j as Angle * 360.0 / *count as Angle)
                    .collect()
            })
            .collect();
        Ok(HrirDatabase::new(elevations, azimuths, left, right, true))
    }
}

/// Loader for the CIPIC text distribution: one file per azimuth and
/// ear (`neg30azleft.txt` and the like), each a matrix of 50 elevation
/// rows by 200 samples.
pub struct CipicLoader {
    directory: PathBuf,
}

impl CipicLoader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn file_name(azimuth: isize, ear: Ear) -> String {
        let sign = if azimuth < 0 { "neg" } else { "" };
        let ear = match ear {
            Ear::Left => "left",
            Ear::Right => "right",
        };
        format!("{sign}{}az{ear}.txt", azimuth.abs())
    }

    fn read_matrix(path: &Path) -> io::Result<Vec<Vec<Sample>>> {
        let text = fs::read_to_string(path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("CIPIC dataset not found at {}: {e}", path.display()),
            )
        })?;
        let mut rows = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let row: Result<Vec<Sample>, _> =
                line.split_whitespace().map(|v| v.parse::<Sample>()).collect();
            rows.push(row.map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("malformed CIPIC matrix {}: {e}", path.display()),
                )
            })?);
        }
        if rows.len() != CIPIC_NUM_ELEVATIONS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "CIPIC matrix {} has {} rows, expected {}",
                    path.display(),
                    rows.len(),
                    CIPIC_NUM_ELEVATIONS
                ),
            ));
        }
        Ok(rows)
    }

    // elevation-major grid: bin i covers -45 + 360/64 * i degrees.
    fn load_ear(&self, ear: Ear) -> io::Result<Vec<Vec<Vec<Sample>>>> {
        let mut by_elevation =
            vec![vec![Vec::new(); CIPIC_AZIMUTHS.len()]; CIPIC_NUM_ELEVATIONS];
        for (azimuth_index, azimuth) in CIPIC_AZIMUTHS.iter().enumerate() {
            let path = self.directory.join(Self::file_name(*azimuth, ear));
            let matrix = Self::read_matrix(&path)?;
            for (elevation_index, hrir) in matrix.into_iter().enumerate() {
                by_elevation[elevation_index][azimuth_index] = hrir;
            }
        }
        Ok(by_elevation)
    }
}

impl HrirLoader for CipicLoader {
    fn load(&self) -> io::Result<HrirDatabase> {
        let left = self.load_ear(Ear::Left)?;
        let right = self.load_ear(Ear::Right)?;
        let elevations: Vec<Angle> = (0..CIPIC_NUM_ELEVATIONS)
            .map(|i| -45.0 + 360.0 / 64.0 * i as Angle)
            .collect();
        let azimuths: Vec<Vec<Angle>> = (0..CIPIC_NUM_ELEVATIONS)
            .map(|_| CIPIC_AZIMUTHS.iter().map(|a| *a as Angle).collect())
            .collect();
        Ok(HrirDatabase::new(elevations, azimuths, left, right, false))
    }
}

/// Binaural directivity: one FIR per ear driven by the shared
/// plane-wave input, with HRIRs looked up from the database and
/// crossfaded on direction changes.
#[derive(Clone)]
pub struct BinauralDirectivity {
    database: Arc<HrirDatabase>,
    update_length: usize,
    reference_orientation: HeadRefOrientation,
    gain: Sample,
    filter_left: FirFilter,
    filter_right: FirFilter,
    previous_point: Option<Point>,
    scratch: Vec<Sample>,
    warned_nan: bool,
}

impl BinauralDirectivity {
    pub fn new(database: Arc<HrirDatabase>, update_length: usize) -> Self {
        Self::with_config(
            database,
            update_length,
            HeadRefOrientation::Standard,
            1.0,
        )
    }

    pub fn with_config(
        database: Arc<HrirDatabase>,
        update_length: usize,
        reference_orientation: HeadRefOrientation,
        gain: Sample,
    ) -> Self {
        Self {
            database,
            update_length,
            reference_orientation,
            gain,
            filter_left: FirFilter::gain_filter(1.0),
            filter_right: FirFilter::gain_filter(1.0),
            previous_point: None,
            scratch: Vec::new(),
            warned_nan: false,
        }
    }

    /// Maps a local direction to the (azimuth, elevation) pair in
    /// degrees expected by the database, under the configured
    /// reference orientation. NaN angles (a collocated source) map to
    /// zero.
    pub fn direction_angles(&mut self, point: &Point) -> (Angle, Angle) {
        let normalized = if point.norm() > 0.0 {
            point.normalized()
        } else {
            *point
        };
        let (mut azimuth, mut elevation) = match self.reference_orientation {
            HeadRefOrientation::Standard => {
                let elevation = normalized.z().asin().to_degrees();
                let azimuth = normalized.y().atan2(normalized.x()).to_degrees();
                (modulo(azimuth, 360.0), elevation)
            }
            HeadRefOrientation::YZ => {
                // The y_z frame is the standard one rotated a quarter
                // turn about z: the acoustic axis sits on +y.
                let elevation = normalized.z().asin().to_degrees();
                let azimuth = normalized.y().atan2(normalized.x()).to_degrees() - 90.0;
                (modulo(azimuth, 360.0), elevation)
            }
        };
        if azimuth.is_nan() || elevation.is_nan() {
            if !self.warned_nan {
                log::warn!(
                    "direction of arrival is undefined; looking up the frontal response"
                );
                self.warned_nan = true;
            }
            azimuth = 0.0;
            elevation = 0.0;
        }
        (azimuth, elevation)
    }

    fn update_filters(&mut self, point: &Point) {
        let (azimuth, elevation) = self.direction_angles(point);
        let elevation_index = self.database.nearest_elevation_index(elevation);
        let azimuth_index = self
            .database
            .nearest_azimuth_index(elevation_index, azimuth);
        for ear in [Ear::Left, Ear::Right] {
            let hrir = self.database.hrir(ear, elevation_index, azimuth_index);
            if self.scratch.len() != hrir.len() {
                self.scratch.resize(hrir.len(), 0.0);
            }
            for (scaled, sample) in self.scratch.iter_mut().zip(hrir) {
                *scaled = *sample * self.gain;
            }
            let filter = match ear {
                Ear::Left => &mut self.filter_left,
                Ear::Right => &mut self.filter_right,
            };
            filter.set_impulse_response(&self.scratch, self.update_length);
        }
    }
}

impl DirectivityOps for BinauralDirectivity {
    fn receive_and_add(&mut self, input: &[Sample], point: Point, output: &mut BufferViewMut) {
        debug_assert!(output.num_channels() >= 2);
        debug_assert!(output.num_samples() >= input.len());
        let needs_update = match &self.previous_point {
            Some(previous) => !previous.is_equal(&point),
            None => true,
        };
        if needs_update {
            self.update_filters(&point);
            self.previous_point = Some(point);
        }
        for (k, x) in input.iter().enumerate() {
            let left = self.filter_left.process_sample(*x);
            let right = self.filter_right.process_sample(*x);
            output.add_sample(0, k, left);
            output.add_sample(1, k, right);
        }
    }

    fn reset_state(&mut self) {
        self.filter_left.reset_state();
        self.filter_right.reset_state();
    }
}
