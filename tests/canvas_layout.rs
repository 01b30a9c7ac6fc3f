use denoising_trainer::{
    Batch, DataDims, Error, Float,
    canvas::{blank_canvas, build_canvas, canvas_dim, save_png, write_snapshots},
};
use ndarray::{Array3, s};

#[test]
fn canvas_dimensions() {
    let dims = DataDims::new(28, 28, 1);
    assert_eq!(canvas_dim(dims, 3), (84, 104, 1));
    let dims = DataDims::new(32, 16, 3);
    assert_eq!(canvas_dim(dims, 2), (64, 68, 3));
}

#[test]
fn background_is_dark_for_gray_and_light_for_colour() {
    let gray = blank_canvas(DataDims::new(4, 4, 1), 3);
    assert_eq!(gray[[11, 31, 0]], 0.0);
    assert!(gray.iter().all(|&v| v == 0.0));

    let colour = blank_canvas(DataDims::new(4, 4, 3), 3);
    assert_eq!(colour[[11, 31, 2]], 1.0);
    assert!(colour.iter().all(|&v| v == 1.0));
}

#[test]
fn tiles_land_in_their_columns() {
    let dims = DataDims::new(2, 3, 1);
    let test = Batch::from_elem(dims.batch_shape(4), 0.25);
    let noisy = Batch::from_elem(dims.batch_shape(4), 0.5);
    let recon = Batch::from_elem(dims.batch_shape(4), 0.75);

    let canvas = build_canvas(dims, test.view(), noisy.view(), recon.view(), 3, |s| {
        s.to_owned()
    })
    .unwrap();
    assert_eq!(canvas.dim(), (6, 29, 1));

    let column = |c: usize| canvas.slice(s![.., c, 0]).to_owned();
    let all = |c: usize, v: Float| column(c).iter().all(|&x| x == v);
    for c in 0..3 {
        assert!(all(c, 0.25), "column {c}");
    }
    for c in 3..13 {
        assert!(all(c, 0.0), "gap column {c}");
    }
    for c in 13..16 {
        assert!(all(c, 0.5), "column {c}");
    }
    for c in 16..26 {
        assert!(all(c, 0.0), "gap column {c}");
    }
    for c in 26..29 {
        assert!(all(c, 0.75), "column {c}");
    }
}

#[test]
fn display_is_applied_to_every_tile() {
    let dims = DataDims::new(2, 2, 1);
    let batch = Batch::zeros(dims.batch_shape(1));
    let canvas = build_canvas(dims, batch.view(), batch.view(), batch.view(), 1, |s| {
        s.mapv(|v| v + 2.0)
    })
    .unwrap();
    assert_eq!(canvas.iter().filter(|&&v| v == 2.0).count(), 3 * 4);
}

#[test]
fn display_changing_shape_is_rejected() {
    let dims = DataDims::new(2, 2, 1);
    let batch = Batch::zeros(dims.batch_shape(1));
    let err = build_canvas(dims, batch.view(), batch.view(), batch.view(), 1, |_| {
        Array3::zeros((3, 3, 1))
    })
    .unwrap_err();
    assert!(matches!(err, Error::InvalidShape(_)));
}

#[test]
fn samples_of_the_wrong_size_are_rejected() {
    let dims = DataDims::new(2, 2, 1);
    let good = Batch::zeros(dims.batch_shape(3));
    let bad = Batch::zeros((3, 2, 3, 1));
    let err = build_canvas(dims, good.view(), bad.view(), good.view(), 1, |s| s.to_owned())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidShape(_)));
}

#[test]
fn rgb_snapshots_round_trip_through_png() {
    let dir = tempfile::tempdir().unwrap();
    let dims = DataDims::new(3, 4, 3);
    let mut canvas = blank_canvas(dims, 2);
    canvas.slice_mut(s![0..3, 0..4, 0]).fill(0.0);

    let snapshot = write_snapshots(canvas.view(), &dir.path().join("nested"), 7).unwrap();
    assert_eq!(snapshot, dir.path().join("nested").join("epoch7.png"));

    let img = image::open(&snapshot).unwrap().to_rgb8();
    assert_eq!((img.width(), img.height()), (32, 6));
    assert_eq!(img.get_pixel(0, 0).0, [0, 255, 255]);
    assert_eq!(img.get_pixel(31, 5).0, [255, 255, 255]);
    assert!(dir.path().join("nested").join("current.png").is_file());
}

#[test]
fn two_channel_canvas_cannot_be_encoded() {
    let dir = tempfile::tempdir().unwrap();
    let canvas = Array3::<Float>::zeros((2, 2, 2));
    let err = save_png(canvas.view(), &dir.path().join("x.png")).unwrap_err();
    assert!(matches!(err, Error::InvalidShape(_)));
}
