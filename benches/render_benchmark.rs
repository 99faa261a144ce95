//! Benchmarks for quire composition and rendering performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks build synthetic documents and render them with each backend.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quire::render::RenderOptions;
use quire::{BackendRegistry, Container, Document, DocumentBuilder, DocumentConfig, Style};

/// Creates a synthetic document with the given number of chapters.
fn create_test_document(chapters: usize) -> Document {
    let config = DocumentConfig::new()
        .with_title("Benchmark")
        .with_author("quire")
        .with_toc(2, "Contents")
        .with_paragraph_numbers(true);
    let mut builder = DocumentBuilder::new(config).unwrap();

    for i in 0..chapters {
        builder
            .with_section(&format!("Chapter {}", i + 1), |chapter| {
                for j in 0..5 {
                    chapter.with_section(&format!("Part {}", j + 1), |part| {
                        part.with_paragraph(|p| {
                            p.text("Benchmark test content for quire")?;
                            p.styled(Style::Italic, |p| {
                                p.text("rendering")?;
                                p.styled_text(Style::Bold, "performance")?;
                                Ok(())
                            })?;
                            p.text("measurement")?.period()?;
                            p.indexed(&format!("term {}", j))?;
                            p.citation(&format!("source {}", i % 7))?;
                            p.footnote_text("A short note.")?;
                            Ok(())
                        })?;
                        part.with_list(true, |list| {
                            list.item_text("first")?.item_text("second")?;
                            Ok(())
                        })?;
                        part.q("A quoted passage.")
                    })?;
                }
                Ok(())
            })
            .unwrap();
    }

    builder.finish()
}

/// Benchmark document construction at various sizes.
fn bench_composition(c: &mut Criterion) {
    let mut group = c.benchmark_group("composition");

    for chapters in [1, 10, 50].iter() {
        group.bench_function(format!("{}_chapters", chapters), |b| {
            b.iter(|| create_test_document(black_box(*chapters)));
        });
    }

    group.finish();
}

/// Benchmark each backend on the same document.
fn bench_backends(c: &mut Criterion) {
    let doc = create_test_document(10);
    let registry = BackendRegistry::with_defaults();
    let options = RenderOptions::default();
    let mut group = c.benchmark_group("render");

    for name in ["docx", "pdf", "epub"] {
        group.bench_function(name, |b| {
            b.iter(|| registry.render(name, black_box(&doc), &options).unwrap());
        });
    }

    group.bench_function("all_parallel", |b| {
        b.iter(|| registry.render_all(black_box(&doc), &options));
    });

    group.finish();
}

criterion_group!(benches, bench_composition, bench_backends);
criterion_main!(benches);
