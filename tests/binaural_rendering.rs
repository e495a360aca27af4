#![allow(clippy::float_cmp)]

use soundfield::math::{is_equal_slice, PI};
use soundfield::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

// A miniature database whose responses are tagged by their bins, so a
// lookup can be identified from the rendered output.
fn tagged_database() -> Arc<HrirDatabase> {
    let elevations: Vec<Angle> = vec![-30.0, 0.0, 30.0];
    let azimuths: Vec<Vec<Angle>> = vec![
        vec![0.0, 90.0, 180.0, 270.0],
        vec![0.0, 90.0, 180.0, 270.0],
        vec![0.0],
    ];
    let tag = |el: usize, az: usize, ear: usize| -> Vec<Sample> {
        vec![(el * 100 + az * 10 + ear) as Sample, 0.5]
    };
    let left: Vec<Vec<Vec<Sample>>> = (0..3)
        .map(|el| (0..azimuths[el].len()).map(|az| tag(el, az, 0)).collect())
        .collect();
    let right: Vec<Vec<Vec<Sample>>> = (0..3)
        .map(|el| (0..azimuths[el].len()).map(|az| tag(el, az, 1)).collect())
        .collect();
    Arc::new(HrirDatabase::new(elevations, azimuths, left, right, true))
}

fn render_impulse(
    receiver: &mut Receiver<BinauralDirectivity>,
    source: Point,
    num_samples: usize,
) -> StereoBuffer {
    let mut output = StereoBuffer::new(num_samples);
    let mut input = vec![0.0; num_samples];
    input[0] = 1.0;
    receiver.receive_and_add(&input, source, 0, &mut output.as_view_mut());
    output
}

#[test]
fn test_frontal_lookup() {
    let directivity = BinauralDirectivity::new(tagged_database(), 0);
    let mut receiver = Receiver::new(
        directivity,
        Point::new(0.0, 0.0, 0.0),
        Quaternion::identity(),
    );
    let output = render_impulse(&mut receiver, Point::new(1.0, 0.0, 0.0), 4);
    // Elevation bin 1 (0 degrees), azimuth bin 0, per ear.
    assert!(is_equal_slice(output.left_read_view(), &[100.0, 0.5, 0.0, 0.0]));
    assert!(is_equal_slice(output.right_read_view(), &[101.0, 0.5, 0.0, 0.0]));
}

#[test]
fn test_lateral_and_vertical_lookup() {
    let database = tagged_database();
    // From the left (+y): azimuth 90.
    let mut receiver = Receiver::new(
        BinauralDirectivity::new(database.clone(), 0),
        Point::new(0.0, 0.0, 0.0),
        Quaternion::identity(),
    );
    let output = render_impulse(&mut receiver, Point::new(0.0, 1.0, 0.0), 2);
    assert_eq!(output.left_read_view()[0], 110.0);

    // From straight above: elevation clamps to the top bin, which has
    // a single azimuth slot.
    let mut receiver = Receiver::new(
        BinauralDirectivity::new(database.clone(), 0),
        Point::new(0.0, 0.0, 0.0),
        Quaternion::identity(),
    );
    let output = render_impulse(&mut receiver, Point::new(0.0, 0.0, 1.0), 2);
    assert_eq!(output.left_read_view()[0], 200.0);

    // Azimuth wraps: -80 degrees is nearest the 270 bin.
    let mut receiver = Receiver::new(
        BinauralDirectivity::new(database, 0),
        Point::new(0.0, 0.0, 0.0),
        Quaternion::identity(),
    );
    let azimuth = (-80.0 as Angle).to_radians();
    let output = render_impulse(
        &mut receiver,
        Point::new(azimuth.cos(), azimuth.sin(), 0.0),
        2,
    );
    assert_eq!(output.left_read_view()[0], 130.0);
}

#[test]
fn test_y_z_reference_orientation() {
    // With the y_z reference the acoustic axis sits on +y.
    let directivity =
        BinauralDirectivity::with_config(tagged_database(), 0, HeadRefOrientation::YZ, 1.0);
    let mut receiver = Receiver::new(
        directivity,
        Point::new(0.0, 0.0, 0.0),
        Quaternion::identity(),
    );
    let output = render_impulse(&mut receiver, Point::new(0.0, 1.0, 0.0), 2);
    assert_eq!(output.left_read_view()[0], 100.0);
}

#[test]
fn test_rotated_receiver_is_bit_equal() {
    // A front-facing receiver hearing a wave from +x and a receiver
    // rotated a quarter turn about +z hearing a wave from +y see the
    // same local direction and produce identical buffers.
    let database = tagged_database();
    let mut front = Receiver::new(
        BinauralDirectivity::new(database.clone(), 0),
        Point::new(0.0, 0.0, 0.0),
        Quaternion::identity(),
    );
    let mut rotated = Receiver::new(
        BinauralDirectivity::new(database, 0),
        Point::new(0.0, 0.0, 0.0),
        axang_to_quat(0.0, 0.0, 1.0, PI / 2.0),
    );
    let output_front = render_impulse(&mut front, Point::new(1.0, 0.0, 0.0), 8);
    let output_rotated = render_impulse(&mut rotated, Point::new(0.0, 1.0, 0.0), 8);
    assert_eq!(output_front.left_read_view(), output_rotated.left_read_view());
    assert_eq!(
        output_front.right_read_view(),
        output_rotated.right_read_view()
    );
}

#[test]
fn test_per_wave_instances_are_independent() {
    let database = tagged_database();
    let mut receiver = Receiver::new(
        BinauralDirectivity::new(database, 0),
        Point::new(0.0, 0.0, 0.0),
        Quaternion::identity(),
    );
    let mut output = StereoBuffer::new(2);
    // Wave 0 from the front, wave 1 from the left, one sample each;
    // their filter states do not mix.
    receiver.receive_and_add(&[1.0], Point::new(1.0, 0.0, 0.0), 0, &mut output.as_view_mut());
    receiver.receive_and_add(&[1.0], Point::new(0.0, 1.0, 0.0), 1, &mut output.as_view_mut());
    assert_eq!(output.left_read_view()[0], 100.0 + 110.0);

    // The same wave id reuses its instance: the second sample of the
    // front HRIR comes out next.
    let mut next = StereoBuffer::new(1);
    receiver.receive_and_add(&[0.0], Point::new(1.0, 0.0, 0.0), 0, &mut next.as_view_mut());
    assert_eq!(next.left_read_view()[0], 0.5);
}

#[test]
fn test_direction_change_crossfades() {
    // A nonzero update length ramps between HRIRs instead of jumping.
    let database = tagged_database();
    let update_length = 4;
    let mut receiver = Receiver::new(
        BinauralDirectivity::new(database, update_length),
        Point::new(0.0, 0.0, 0.0),
        Quaternion::identity(),
    );
    // Prime with the frontal response on a constant signal.
    let mut warmup = StereoBuffer::new(8);
    receiver.receive_and_add(
        &[1.0; 8],
        Point::new(1.0, 0.0, 0.0),
        0,
        &mut warmup.as_view_mut(),
    );
    let steady = warmup.left_read_view()[7];
    // Switch to the lateral response; the output drifts toward the
    // new steady state over update_length samples.
    let mut faded = StereoBuffer::new(8);
    receiver.receive_and_add(
        &[1.0; 8],
        Point::new(0.0, 1.0, 0.0),
        0,
        &mut faded.as_view_mut(),
    );
    let target = 110.0 + 0.5;
    let first = faded.left_read_view()[0];
    assert!(first > steady && first < target);
    for k in 1..=update_length {
        assert!(faded.left_read_view()[k] > faded.left_read_view()[k - 1]);
    }
    assert_eq!(faded.left_read_view()[update_length + 1], target);
}

#[test]
fn test_normalising_gain() {
    let directivity = BinauralDirectivity::with_config(
        tagged_database(),
        0,
        HeadRefOrientation::Standard,
        0.1,
    );
    let mut receiver = Receiver::new(
        directivity,
        Point::new(0.0, 0.0, 0.0),
        Quaternion::identity(),
    );
    let output = render_impulse(&mut receiver, Point::new(1.0, 0.0, 0.0), 2);
    assert!((output.left_read_view()[0] - 10.0).abs() < 1.0e-9);
}

#[test]
fn test_filter_all() {
    let mut database = HrirDatabase::new(
        vec![0.0],
        vec![vec![0.0]],
        vec![vec![vec![1.0, 0.0, 0.0]]],
        vec![vec![vec![0.0, 1.0, 0.0]]],
        true,
    );
    // Pre-apply a one-sample delay across the whole set.
    let mut delay = FirFilter::new(vec![0.0, 1.0], 16);
    database.filter_all(&mut delay);
    assert!(is_equal_slice(database.hrir(Ear::Left, 0, 0), &[0.0, 1.0, 0.0]));
    assert!(is_equal_slice(database.hrir(Ear::Right, 0, 0), &[0.0, 0.0, 1.0]));
}

#[test]
fn test_collocated_source_warns_and_uses_front() {
    let mut receiver = Receiver::new(
        BinauralDirectivity::new(tagged_database(), 0),
        Point::new(0.0, 0.0, 0.0),
        Quaternion::identity(),
    );
    // A wave from the receiver position has no direction; the frontal
    // response is used and nothing blows up.
    let output = render_impulse(&mut receiver, Point::new(0.0, 0.0, 0.0), 2);
    assert_eq!(output.left_read_view()[0], 100.0);
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("soundfield-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

const KEMAR_ELEVATIONS: [isize; 14] = [-40, -30, -20, -10, 0, 10, 20, 30, 40, 50, 60, 70, 80, 90];
const KEMAR_COUNTS: [usize; 14] = [56, 60, 72, 72, 72, 72, 72, 60, 56, 45, 36, 24, 12, 1];

fn write_kemar_fixture(dir: &PathBuf) {
    for (i, elevation) in KEMAR_ELEVATIONS.iter().enumerate() {
        let count = KEMAR_COUNTS[i];
        let elev_dir = dir.join(format!("elev{elevation}"));
        fs::create_dir_all(&elev_dir).unwrap();
        let resolution = 360.0 / count as f64;
        for j in 0..(count / 2 + 1) {
            let angle = (j as f64 * resolution).round() as isize;
            let path = elev_dir.join(format!("H{elevation}e{angle:03}a.dat"));
            // Two stereo frames tagged with the elevation index and
            // azimuth slot.
            let first = (i as i16 + 1) * 100 + j as i16;
            let second = -(first);
            let mut bytes = Vec::new();
            for value in [first, second, first / 2, second / 2] {
                bytes.extend_from_slice(&value.to_be_bytes());
            }
            fs::write(path, bytes).unwrap();
        }
    }
}

#[test]
fn test_kemar_loader() {
    let dir = scratch_dir("kemar");
    write_kemar_fixture(&dir);
    let database = KemarLoader::new(&dir).load().unwrap();
    assert_eq!(database.num_elevations(), 14);
    assert_eq!(database.num_azimuths(0), 56);
    assert_eq!(database.num_azimuths(13), 1);
    // The frontal measurement lands in azimuth slot 0 at elevation
    // index 4 with the first channel on the right-ear database.
    let expected = (5.0 * 100.0) / 30000.0;
    let right = database.hrir(Ear::Right, 4, 0);
    assert_eq!(right.len(), 2);
    assert!((right[0] - expected as Sample).abs() < 1.0e-9);
    let left = database.hrir(Ear::Left, 4, 0);
    assert!((left[0] + expected as Sample).abs() < 1.0e-9);
    // Mirrored azimuths swap the ears: the right-ear response at the
    // mirrored slot equals the left-ear response at the measured one.
    let mirrored = database.hrir(Ear::Right, 4, 71);
    let direct = database.hrir(Ear::Left, 4, 1);
    assert!((mirrored[0] - direct[0]).abs() < 1.0e-9);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_kemar_loader_missing_directory() {
    let result = KemarLoader::new("/nonexistent/kemar-data").load();
    assert!(result.is_err());
    let message = result.err().unwrap().to_string();
    assert!(message.contains("Kemar"), "unhelpful error: {message}");
}

#[test]
fn test_cipic_loader() {
    let dir = scratch_dir("cipic");
    let azimuths: [isize; 25] = [
        -80, -65, -55, -45, -40, -35, -30, -25, -20, -15, -10, -5, 0, 5, 10, 15, 20, 25, 30, 35,
        40, 45, 55, 65, 80,
    ];
    for azimuth in azimuths {
        for ear in ["left", "right"] {
            let sign = if azimuth < 0 { "neg" } else { "" };
            let path = dir.join(format!("{sign}{}az{ear}.txt", azimuth.abs()));
            let mut text = String::new();
            for elevation in 0..50 {
                // Four samples per response, tagged by azimuth and
                // elevation.
                text.push_str(&format!(
                    "{} {} 0 0\n",
                    azimuth as f64,
                    elevation as f64
                ));
            }
            fs::write(path, text).unwrap();
        }
    }
    let database = CipicLoader::new(&dir).load().unwrap();
    assert_eq!(database.num_elevations(), 50);
    assert_eq!(database.num_azimuths(0), 25);
    // Elevation bins run from -45 degrees in steps of 360/64.
    assert_eq!(database.nearest_elevation_index(-45.0), 0);
    assert_eq!(database.nearest_elevation_index(0.0), 8);
    // Azimuth lookup clamps to the grid ends.
    assert_eq!(database.nearest_azimuth_index(0, -89.0), 0);
    assert_eq!(database.nearest_azimuth_index(0, 89.0), 24);
    let hrir = database.hrir(Ear::Left, 10, 12);
    assert!(is_equal_slice(hrir, &[0.0, 10.0, 0.0, 0.0]));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_cipic_loader_missing_directory() {
    let result = CipicLoader::new("/nonexistent/cipic-data").load();
    assert!(result.is_err());
}
