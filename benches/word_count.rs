use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use proofreader_rs::{SuggestionMatch, count_words, render_matches};

const PARAGRAPH: &str = "The colour of the harbour changed as the afternoon wore on, \
and the neighbours gathered along the quay to watch the boats return.\n\t";

fn corpus(words: usize) -> String {
    let per_paragraph = count_words(PARAGRAPH);
    PARAGRAPH.repeat(words / per_paragraph + 1)
}

fn bench_count_words(c: &mut Criterion) {
    const SIZES: &[usize] = &[100, 1_000, 5_000, 20_000];
    for &size in SIZES {
        let text = corpus(size);
        c.bench_with_input(BenchmarkId::new("count_words", size), &text, |b, text| {
            b.iter(|| black_box(count_words(text)));
        });
    }
}

fn bench_render_matches(c: &mut Criterion) {
    const CASES: &[usize] = &[1, 25, 250];
    for &count in CASES {
        let matches: Vec<SuggestionMatch> = (0..count)
            .map(|index| {
                SuggestionMatch::new(
                    format!("Possible spelling mistake #{index} <found>."),
                    "...the <colour> & the harbour...",
                    ["color", "colours", "collar"],
                )
            })
            .collect();
        c.bench_with_input(
            BenchmarkId::new("render_matches", count),
            &matches,
            |b, matches| {
                b.iter(|| {
                    let view = render_matches(matches);
                    black_box(view.cards().len());
                });
            },
        );
    }
}

criterion_group!(benches, bench_count_words, bench_render_matches);
criterion_main!(benches);
