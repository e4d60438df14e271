use divan::AllocProfiler;
use divan::{Bencher, black_box};
use evalb::{Scorer, aggregate, parse};

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

const GOLD: &str = "(IP (NP (NP (NR 上海) (NR 浦东)) (NP (NN 开发) (CC 与) (NN 法制) (NN 建设))) (VP (VV 同步)))";
const TEST: &str = "(IP (NP (NR 上海) (NR 浦东)) (NP (NN 开发) (CC 与) (NN 法制)) (VP (NN 建设) (VV 同步)))";

/// Right-branching tree over `n` words
fn deep_line(n: usize) -> String {
    let mut line = String::new();
    for i in 0..n {
        line.push_str(&format!("(X{} (W w{}) ", i % 7, i));
    }
    line.push_str(&")".repeat(n));
    line
}

#[divan::bench]
fn parse_sentence() {
    black_box(parse(black_box(GOLD)).unwrap());
}

#[divan::bench(args = [10, 100, 1000])]
fn parse_deep(bencher: Bencher, n: usize) {
    let line = deep_line(n);
    bencher.bench_local(|| black_box(parse(black_box(&line)).unwrap()));
}

#[divan::bench]
fn score_pair(bencher: Bencher) {
    let gold = parse(GOLD).unwrap();
    let test = parse(TEST).unwrap();
    let scorer = Scorer::new();
    bencher.bench_local(|| black_box(scorer.score_trees(black_box(&gold), black_box(&test))));
}

#[divan::bench(sample_count = 10)]
fn score_corpus(bencher: Bencher) {
    let gold = vec![GOLD; 10_000];
    let test = vec![TEST; 10_000];
    let scorer = Scorer::new();
    bencher.bench_local(|| {
        let results: Vec<_> = scorer.score_corpus(&gold, &test).collect();
        black_box(aggregate(&results));
    });
}
