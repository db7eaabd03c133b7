use super::*;

fn document(text: &str) -> Document {
    Document::new(text, Source::page("yogurt.pdf", 3))
}

fn config(chunk_size: usize, chunk_overlap: usize) -> ChunkingConfig {
    ChunkingConfig {
        chunk_size,
        chunk_overlap,
    }
}

fn sample_text() -> String {
    [
        "Yoğurtlu çorba için iki su bardağı yoğurdu bir yumurta ve bir kaşık unla çırpın.",
        "Tencereye beş su bardağı su ekleyin ve karıştırarak kaynatın.\nPirinci ekleyip pişirin.",
        "Tereyağında kuru nane yakıp çorbanın üzerine gezdirin. Sıcak servis edin.",
        "Cacık için salatalığı rendeleyin, süzme yoğurt, sarımsak ve dereotu ile karıştırın.",
    ]
    .join("\n\n")
        .repeat(3)
}

#[test]
fn small_document_is_single_chunk() {
    let doc = document("Yogurt soup: mix 2 cups yogurt with dill.");
    let chunks: Vec<Chunk> = split(&doc, &ChunkingConfig::default()).collect();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, doc.text);
    assert_eq!(chunks[0].overlap, 0);
    assert_eq!(chunks[0].index, 0);
    assert_eq!(chunks[0].source, Source::page("yogurt.pdf", 3));
}

#[test]
fn empty_document_has_no_chunks() {
    let doc = document("");
    assert_eq!(split(&doc, &ChunkingConfig::default()).count(), 0);
}

#[test]
fn chunks_respect_size_and_overlap() {
    let doc = document(&sample_text());
    let chunks: Vec<Chunk> = split(&doc, &config(120, 30)).collect();

    assert!(chunks.len() > 3);
    for (i, chunk) in chunks.iter().enumerate() {
        assert!(chunk.text.chars().count() <= 120, "chunk {} too long", i);
        assert_eq!(chunk.index, i);
        assert_eq!(chunk.overlap, if i == 0 { 0 } else { 30 });
    }

    // Each chunk starts with the last `overlap` characters of its predecessor
    for pair in chunks.windows(2) {
        let previous: Vec<char> = pair[0].text.chars().collect();
        let tail: String = previous[previous.len() - 30..].iter().collect();
        let head: String = pair[1].text.chars().take(30).collect();
        assert_eq!(tail, head);
    }
}

#[test]
fn reassembly_is_lossless() {
    let text = sample_text();
    let doc = document(&text);

    for (size, overlap) in [(50, 0), (80, 10), (120, 30), (200, 150), (1000, 100), (7, 6)] {
        let chunks: Vec<Chunk> = split(&doc, &config(size, overlap)).collect();
        assert_eq!(
            reassemble(&chunks),
            text,
            "reassembly failed for size {} overlap {}",
            size,
            overlap
        );
    }
}

#[test]
fn reassembly_handles_text_without_whitespace() {
    let text = "ğüşıöç".repeat(40);
    let doc = document(&text);
    let chunks: Vec<Chunk> = split(&doc, &config(25, 5)).collect();

    assert!(chunks.iter().all(|c| c.text.chars().count() <= 25));
    assert_eq!(reassemble(&chunks), text);
}

#[test]
fn prefers_paragraph_breaks() {
    let text = format!("{}\n\n{}", "a".repeat(40), "b".repeat(40));
    let doc = document(&text);
    let chunks: Vec<Chunk> = split(&doc, &config(60, 0)).collect();

    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].text.ends_with("\n\n"));
    assert_eq!(chunks[1].text, "b".repeat(40));
}

#[test]
fn overlap_is_clamped_below_size() {
    let doc = document("abcdefghij");
    let chunks: Vec<Chunk> = split(&doc, &config(4, 10)).collect();

    assert!(chunks.iter().skip(1).all(|c| c.overlap == 3));
    assert_eq!(reassemble(&chunks), "abcdefghij");
}

#[test]
fn split_documents_drops_blank_chunks() {
    let docs = vec![
        document("Süzme yoğurt ile haydari."),
        document("   \n\n  "),
        Document::new("Ayran: yoğurt, su, tuz.", Source::file("notes.txt")),
    ];

    let chunks = split_documents(&docs, &ChunkingConfig::default());
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1].source, Source::file("notes.txt"));
}

#[test]
fn preview_is_single_line() {
    let chunk = Chunk {
        text: "Yoğurtlu\nçorba\ttarifi".to_string(),
        source: Source::file("a.txt"),
        index: 0,
        overlap: 0,
    };
    assert_eq!(chunk.preview(14), "Yoğurtlu çorba");
}
