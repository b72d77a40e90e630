use criterion::{criterion_group, criterion_main, Criterion};

use rfslides::rotator::Rotator;
use rfslides::{Document, Page, SlideshowConfig};

fn bench_tick(c: &mut Criterion) {
    let mut doc = Document::from_html(rfslides::DEFAULT_PAGE);
    let mut rotator = Rotator::new(rfslides::DEFAULT_IMAGES, "slideshow").expect("rotator");

    c.bench_function("rotator_tick", |b| {
        b.iter(|| {
            let _ = rotator.tick(&mut doc);
        })
    });
}

fn bench_simulated_day(c: &mut Criterion) {
    c.bench_function("page_simulate_one_day", |b| {
        b.iter(|| {
            let mut page = Page::with_default_page(SlideshowConfig::default()).expect("page");
            page.advance(24 * 3_600 * 1_000)
        })
    });
}

criterion_group!(benches, bench_tick, bench_simulated_day);
criterion_main!(benches);
