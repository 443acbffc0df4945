// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// Hot paths:
//   1. Template render over large merged notebook prompts
//   2. Section merge chains
//   3. Chunk ranking against an in-memory page store

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rusqlite::Connection;

use research_notebook::core::template::Template;
use research_notebook::rag::embeddings::cosine_similarity;
use research_notebook::rag::ingest::chunk_text;
use research_notebook::rag::schema::run_migrations;
use research_notebook::rag::store::{PageChunk, PageStore};

// ─── Helpers ────────────────────────────────────────────────────────────────

/// A commit-log sized blob with literal braces sprinkled in.
fn fake_commit_log(commits: usize) -> String {
    (0..commits)
        .map(|i| {
            format!(
                "Commit({i:07x}): tweak layer {i}\nDiffs:\nFile: model.py - Additions: 3, Deletions: 1\nPatch:\n+ cfg = {{\"lr\": 0.{i}}}\n"
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn notebook_prompt(commits: usize) -> Template {
    let instructions = Template::new("Write the weekly notebook from the data below.");
    let github = Template::new("Repository: {REPO}\nData:\n{GH_DATA}")
        .bind("REPO", "https://github.com/acme/widgets")
        .bind("GH_DATA", fake_commit_log(commits));
    let notes = Template::new("Notes:\n{NOTES}").bind("NOTES", "LayerNorm placement. ".repeat(200));
    instructions.merge(&github).merge(&notes)
}

fn vector(seed: usize, dims: usize) -> Vec<f32> {
    (0..dims)
        .map(|i| ((seed * 31 + i * 7) % 97) as f32 / 97.0)
        .collect()
}

fn populated_store(chunks: usize, dims: usize) -> PageStore {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    run_migrations(&conn).expect("run migrations");
    let store = PageStore::new(conn);
    store
        .create_collection("bench", "bench.pdf")
        .expect("create collection");
    for i in 0..chunks {
        let page = (i / 2) as u32 + 1;
        let idx = (i % 2) as u32;
        let chunk = PageChunk {
            id: PageChunk::make_id("bench", page, idx),
            collection: "bench".into(),
            page,
            chunk_index: idx,
            source: "bench.pdf".into(),
            content: format!("page {page} chunk {idx}"),
        };
        store
            .insert_chunk(&chunk, &vector(i, dims))
            .expect("insert chunk");
    }
    store
}

// ─── Benchmarks ─────────────────────────────────────────────────────────────

fn bench_template(c: &mut Criterion) {
    let mut group = c.benchmark_group("template");

    let small = notebook_prompt(5);
    let large = notebook_prompt(500);

    group.bench_function("render_5_commits", |b| {
        b.iter(|| black_box(small.render().expect("render")))
    });
    group.bench_function("render_500_commits", |b| {
        b.iter(|| black_box(large.render().expect("render")))
    });

    let nested = {
        let inner = Arc::new(large.clone());
        Template::new("<instructions>\n{INSTRUCTIONS}\n</instructions>\n<draft>\n{RESPONSE}\n</draft>")
            .bind("INSTRUCTIONS", inner)
            .bind("RESPONSE", "draft text ".repeat(500))
    };
    group.bench_function("render_nested_critique", |b| {
        b.iter(|| black_box(nested.render().expect("render")))
    });

    let parts: Vec<Template> = (0..50)
        .map(|i| Template::new(format!("part {{P{i}}}")).bind(format!("P{i}"), i.to_string()))
        .collect();
    group.bench_function("merge_all_50_sections", |b| {
        b.iter(|| black_box(Template::merge_all(&parts)))
    });

    group.finish();
}

fn bench_retrieval(c: &mut Criterion) {
    let mut group = c.benchmark_group("retrieval");

    let a = vector(1, 1536);
    let b = vector(2, 1536);
    group.bench_function("cosine_similarity_1536d", |b_iter| {
        b_iter.iter(|| black_box(cosine_similarity(&a, &b)))
    });

    let store = populated_store(400, 256);
    let query = vector(7, 256);
    group.bench_function("top_k_400_chunks", |b| {
        b.iter(|| black_box(store.top_k("bench", &query, 3).expect("top_k")))
    });

    let page = "word ".repeat(20_000);
    group.bench_function("chunk_100k_chars", |b| {
        b.iter(|| black_box(chunk_text(&page, 4000)))
    });

    group.finish();
}

criterion_group!(benches, bench_template, bench_retrieval);
criterion_main!(benches);
