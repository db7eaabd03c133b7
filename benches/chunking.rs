use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use yogurt_chef::corpus::{ChunkingConfig, Document, Source, split, split_documents};

fn cookbook_page(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| {
            format!(
                "Tarif {}: iki su bardağı süzme yoğurdu bir diş sarımsak ve dereotu ile \
                 karıştırın.\nÜzerine tereyağında kızdırılmış pul biber gezdirip servis edin.",
                i
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let document = Document::new(cookbook_page(400), Source::page("yogurt-uygarligi.pdf", 1));
    let config = ChunkingConfig::default();
    c.bench_function("chunking", |b| {
        b.iter(|| split(black_box(&document), black_box(&config)).count())
    });

    let pages: Vec<Document> = (1..=50)
        .map(|page| Document::new(cookbook_page(20), Source::page("yogurt-uygarligi.pdf", page)))
        .collect();
    c.bench_function("chunking_corpus", |b| {
        b.iter(|| split_documents(black_box(&pages), black_box(&config)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
