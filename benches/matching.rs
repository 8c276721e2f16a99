//! Benchmarks for bytecode matching

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rebc::{
    assembler::{assemble, Node},
    Capture, Program,
};

fn identifier_assignment() -> Program {
    assemble(&Node::Sequence(vec![
        Node::AnchorStart,
        Node::group(
            0,
            Node::Sequence(vec![
                Node::class(&[(b'a', b'z'), (b'A', b'Z'), (b'_', b'_')]),
                Node::star(Node::class(&[
                    (b'a', b'z'),
                    (b'A', b'Z'),
                    (b'0', b'9'),
                    (b'_', b'_'),
                ])),
            ]),
        ),
        Node::star(Node::Literal(b' ')),
        Node::Literal(b'='),
        Node::star(Node::Literal(b' ')),
        Node::group(1, Node::plus(Node::class(&[(b'0', b'9')]))),
        Node::AnchorEnd,
    ]))
    .expect("benchmark pattern assembles")
}

fn bench_literal_prefix(c: &mut Criterion) {
    let program = assemble(&Node::literals(b"hello")).unwrap();
    let input = b"hello world";

    c.bench_function("literal_prefix", |b| {
        b.iter(|| program.is_match(black_box(input), &mut []))
    });
}

fn bench_captures(c: &mut Criterion) {
    let program = identifier_assignment();
    let input = b"max_connections = 4096";

    c.bench_function("assignment_captures", |b| {
        b.iter(|| {
            let mut captures = [Capture::default(); 2];
            program.is_match(black_box(input), &mut captures)
        })
    });
}

fn bench_long_repetition(c: &mut Criterion) {
    let program = assemble(&Node::Sequence(vec![
        Node::star(Node::alt(Node::Literal(b'a'), Node::Literal(b'b'))),
        Node::AnchorEnd,
    ]))
    .unwrap();
    let input: Vec<u8> = b"ab".iter().copied().cycle().take(4096).collect();

    c.bench_function("alternation_star_4k", |b| {
        b.iter(|| program.is_match(black_box(&input), &mut []))
    });
}

criterion_group!(
    benches,
    bench_literal_prefix,
    bench_captures,
    bench_long_repetition
);
criterion_main!(benches);
