use rfslides::{Error, SlideshowConfig};
use std::path::PathBuf;

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("rfslides-{}-{}", std::process::id(), name));
    std::fs::write(&p, contents).expect("write temp file");
    p
}

#[test]
fn partial_config_file_keeps_defaults() {
    let path = temp_file("partial.json", r#"{ "images": ["x.jpg", "y.jpg"], "dismiss": { "marker_class": "alert" } }"#);
    let cfg = SlideshowConfig::from_file(&path).expect("load config");
    assert_eq!(cfg.images, vec!["x.jpg", "y.jpg"]);
    assert_eq!(cfg.interval_ms, 10_000);
    assert_eq!(cfg.dismiss.marker_class, "alert");
    assert_eq!(cfg.dismiss.fade_delay_ms, 5_000);
    assert!(cfg.dismiss.enabled);
    let _ = std::fs::remove_file(path);
}

#[test]
fn missing_config_file_is_io_error() {
    let err = SlideshowConfig::from_file("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn config_round_trips_through_json() {
    let cfg = SlideshowConfig::default();
    let text = serde_json::to_string(&cfg).unwrap();
    assert_eq!(SlideshowConfig::from_json(&text).unwrap(), cfg);
}

#[test]
fn new_page_loads_html_file_or_demo_page() {
    let path = temp_file("page.html", r#"<html><body><img id="hero"></body></html>"#);
    let cfg = SlideshowConfig { display_id: "hero".into(), ..Default::default() };
    let mut page = rfslides::new_page(cfg, Some(path.as_path())).expect("load page");
    page.advance(10_000);
    assert!(page.document().to_html().contains("src=\"/images/ssssource.jpg\""));
    let _ = std::fs::remove_file(path);

    let demo = rfslides::new_page(SlideshowConfig::default(), None).expect("demo page");
    assert!(demo.document().to_html().contains("id=\"slideshow\""));
}
