use docintel_core::traits::VectorIndex;
use docintel_core::types::{Chunk, ChunkMetadata, MetadataFilter, SourceKind};
use docintel_core::Chunker;
use docintel_vector::{HashEmbedder, MemoryVectorIndex};

fn chunk(id: usize, text: &str, source: &str) -> Chunk {
    Chunk {
        id,
        text: text.to_string(),
        start: 0,
        end: text.len(),
        token_count: text.split_whitespace().count(),
        metadata: ChunkMetadata::with_source(source).with_extra("category", if source.starts_with("fire") { "fire" } else { "water" }),
    }
}

fn index() -> MemoryVectorIndex {
    let index = MemoryVectorIndex::new(Box::new(HashEmbedder::default()));
    let chunks = vec![
        chunk(0, "dry tinder catches a spark quickly", "fire.txt"),
        chunk(1, "dry tinder catches a spark quickly indeed", "fire.txt"),
        chunk(2, "kindling and logs keep a fire burning", "fire.txt"),
        chunk(3, "rain barrels collect water from gutters", "water.txt"),
        chunk(4, "boil water before drinking", "water.txt"),
    ];
    assert_eq!(index.add(&chunks).expect("add"), 5);
    index
}

#[test]
fn similarity_search_ranks_overlapping_text_first() {
    let index = index();
    let hits = index.similarity_search("tinder spark", 3, None).expect("search");
    assert_eq!(hits.len(), 3);
    assert!(matches!(hits[0].chunk_id, Some(0) | Some(1)));
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(hits.iter().all(|h| h.source == SourceKind::Vector));
    assert!(hits[0].score <= 1.0 + 1e-5);
}

#[test]
fn k_larger_than_index_returns_everything() {
    let index = index();
    assert_eq!(index.similarity_search("water", 50, None).expect("search").len(), 5);
    assert!(index.similarity_search("water", 0, None).expect("search").is_empty());
}

#[test]
fn filters_restrict_by_metadata() {
    let index = index();
    let mut filter = MetadataFilter::new();
    filter.insert("category".into(), "water".into());
    let hits = index.similarity_search("dry tinder", 5, Some(&filter)).expect("search");
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.metadata.source.as_deref() == Some("water.txt")));

    filter.insert("source".into(), "nowhere.txt".into());
    assert!(index.similarity_search("dry tinder", 5, Some(&filter)).expect("search").is_empty());
}

#[test]
fn diversity_search_skips_near_duplicates() {
    let index = index();
    let plain = index.similarity_search("dry tinder spark fire", 2, None).expect("search");
    let plain_ids: Vec<_> = plain.iter().filter_map(|h| h.chunk_id).collect();
    assert_eq!(plain_ids, vec![0, 1]);

    let diverse = index.diversity_search("dry tinder spark fire", 2, 5, 0.5, None).expect("search");
    let ids: Vec<_> = diverse.iter().filter_map(|h| h.chunk_id).collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], 0);
    assert_ne!(ids[1], 1);
}

#[test]
fn neighbors_are_window_around_chunk_in_same_source() {
    let index = MemoryVectorIndex::new(Box::new(HashEmbedder::new(32)));
    let text = "One.\n\nTwo.\n\nThree.\n\nFour.\n\nFive.";
    let chunker = Chunker::from_name(100, 0, "paragraph").expect("chunker");
    index.add(&chunker.chunk(text, Some(&ChunkMetadata::with_source("a.txt")))).expect("add");
    index.add(&chunker.chunk(text, Some(&ChunkMetadata::with_source("b.txt")))).expect("add");

    let around: Vec<_> = index.neighbors("a.txt", 2, 1).expect("neighbors").into_iter().map(|h| h.text).collect();
    assert_eq!(around, vec!["Two.", "Three.", "Four."]);
    let edge: Vec<_> = index.neighbors("b.txt", 0, 1).expect("neighbors").into_iter().filter_map(|h| h.chunk_id).collect();
    assert_eq!(edge, vec![0, 1]);
    assert!(index.neighbors("missing.txt", 0, 3).expect("neighbors").is_empty());
}
