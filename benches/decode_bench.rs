use criterion::{black_box, criterion_group, criterion_main, Criterion};
use psdvec::document::Document;
use psdvec::path::{construct_path, IdGen};
use std::io::Cursor;

// Minimal big-endian writer, enough to synthesise benchmark documents.
struct Builder {
    buf: Vec<u8>,
}

impl Builder {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    fn i16(&mut self, v: i16) -> &mut Self {
        self.raw(&v.to_be_bytes())
    }

    fn u16(&mut self, v: u16) -> &mut Self {
        self.raw(&v.to_be_bytes())
    }

    fn i32(&mut self, v: i32) -> &mut Self {
        self.raw(&v.to_be_bytes())
    }

    fn u32(&mut self, v: u32) -> &mut Self {
        self.raw(&v.to_be_bytes())
    }

    fn fixed(&mut self, v: f64) -> &mut Self {
        self.i32((v * (1u32 << 24) as f64) as i32)
    }

    fn section(&mut self, body: impl FnOnce(&mut Builder)) -> &mut Self {
        let mut inner = Builder::new();
        body(&mut inner);
        self.u32(inner.buf.len() as u32);
        self.raw(&inner.buf)
    }
}

fn write_vector_mask(b: &mut Builder, knots: usize) {
    b.raw(b"8BIM").raw(b"vmsk").section(|s| {
        s.i32(3).u32(0);
        s.i16(0).u16(knots as u16).i16(1).raw(&[0u8; 20]);
        for i in 0..knots {
            let t = i as f64 / knots as f64;
            s.i16(1);
            for _ in 0..3 {
                s.fixed(t).fixed(1.0 - t); // y then x
            }
        }
    });
}

fn synthetic_document(layers: u16, knots_per_layer: usize) -> Vec<u8> {
    let mut b = Builder::new();
    b.raw(b"8BPS").i16(1);
    b.i16(0).i32(0);
    b.u16(3).i32(1080).i32(1920).u16(8).u16(3);
    b.u32(0);
    b.u32(0);
    b.section(|s| {
        s.section(|li| {
            li.i16(layers as i16);
            for _ in 0..layers {
                li.i32(0).i32(0).i32(1080).i32(1920);
                li.u16(0);
                li.raw(b"8BIM").raw(b"norm");
                li.u8(255).u8(0).u8(0).u8(0);
                li.section(|ex| {
                    ex.u32(0);
                    ex.u32(0);
                    ex.u8(5).raw(b"layer").raw(&[0, 0]); // name, padded to 4
                    write_vector_mask(ex, knots_per_layer);
                });
            }
        });
        s.u32(0);
    });
    b.buf
}

fn bench_decode_document(c: &mut Criterion) {
    let bytes = synthetic_document(64, 32);

    c.bench_function("decode_64_layers_32_knots", |b| {
        b.iter(|| Document::read(Cursor::new(black_box(&bytes))).unwrap())
    });
}

fn bench_reconstruct_paths(c: &mut Criterion) {
    let bytes = synthetic_document(1, 256);
    let doc = Document::read(Cursor::new(&bytes)).unwrap();
    let mask = doc.layers[0].extra.vector_mask().unwrap();

    c.bench_function("reconstruct_256_knot_path", |b| {
        b.iter(|| {
            let mut ids = IdGen::new();
            construct_path(black_box(mask), &doc.bounds, &mut ids).unwrap()
        })
    });
}

criterion_group!(benches, bench_decode_document, bench_reconstruct_paths);
criterion_main!(benches);
