//! Integration tests for the choropleth renderer

use envrisk_core::models::Symbology;
use envrisk_render::{RenderOutcome, RenderSettings, Renderer, Scene, Shape};
use geo::{coord, polygon, MultiPolygon};
use proptest::prelude::*;

fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: x, y: y),
        (x: x + size, y: y),
        (x: x + size, y: y + size),
        (x: x, y: y + size),
    ]])
}

#[test]
fn test_empty_scene_renders_no_image() {
    let symbology = Symbology::default();
    let scene = Scene::new(&symbology, coord! { x: 0.0, y: 0.0 });

    let outcome = Renderer::default().render(&scene).unwrap();
    assert_eq!(outcome, RenderOutcome::NoImage);
    assert!(outcome.image().is_none());
}

#[test]
fn test_single_record_renders_flat_color() {
    let symbology = Symbology::default();
    let shape = square(0.0, 0.0, 5_000.0);
    let scene = Scene::new(&symbology, coord! { x: 1_000.0, y: 1_000.0 })
        .shape(Shape { geometry: &shape, intensity: 42.0, code: None });

    let outcome = Renderer::default().render(&scene).unwrap();
    let image = outcome.image().expect("single record must render");
    assert_eq!(image.mime_type, "image/jpeg");
    assert!(image.len() <= RenderSettings::default().max_image_bytes);
}

#[test]
fn test_settings_change_canvas_size() {
    let symbology = Symbology::desertification();
    let shape = square(0.0, 0.0, 100.0);
    let scene = Scene::new(&symbology, coord! { x: 50.0, y: 50.0 })
        .shape(Shape { geometry: &shape, intensity: 0.0, code: Some(2) });

    let renderer = Renderer::new(RenderSettings { width: 120, height: 90, ..Default::default() });
    let raster = renderer.rasterize(&scene).unwrap();
    assert_eq!((raster.width(), raster.height()), (120, 90));

    let image = renderer.render(&scene).unwrap();
    let image = image.image().unwrap();
    assert_eq!((image.width, image.height), (120, 90));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Rasterizing the same scene twice gives identical pixels.
    #[test]
    fn prop_rasterization_is_deterministic(
        values in proptest::collection::vec(0.0f64..1_000.0, 1..6),
        mx in -2_000.0f64..8_000.0,
        my in -2_000.0f64..2_000.0,
    ) {
        let symbology = Symbology::default();
        let shapes: Vec<MultiPolygon<f64>> =
            (0..values.len()).map(|i| square(i as f64 * 1_000.0, 0.0, 900.0)).collect();
        let scene = values.iter().zip(&shapes).fold(
            Scene::new(&symbology, coord! { x: mx, y: my }),
            |scene, (value, geometry)| scene.shape(Shape { geometry, intensity: *value, code: None }),
        );

        let renderer = Renderer::default();
        let first = renderer.rasterize(&scene).unwrap();
        let second = renderer.rasterize(&scene).unwrap();
        prop_assert_eq!(first.to_rgb(), second.to_rgb());
    }
}
