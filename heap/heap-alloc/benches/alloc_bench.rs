use criterion::{Criterion, criterion_group, criterion_main};
use heap_alloc::Heap;
use heap_segment::SimulatedSegment;

// Simple LCG for deterministic "random" sizes.
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state
    }

    fn range(&mut self, min: usize, max: usize) -> usize {
        let r = self.next_u64() as usize;
        min + (r % (max - min))
    }
}

fn new_heap(capacity: usize) -> Heap<SimulatedSegment<'static>> {
    let arena = Vec::leak(vec![0u8; capacity]);
    Heap::new(SimulatedSegment::new(arena))
}

fn bench_simple_cycle(c: &mut Criterion) {
    let mut heap = new_heap(8 * 1024 * 1024);
    c.bench_function("simple_alloc_free_cycle", |b| {
        b.iter(|| {
            let p = heap.allocate(64).unwrap();
            unsafe { heap.free(p) };
        });
    });
}

fn bench_fragmentation(c: &mut Criterion) {
    // Generous arena: split slack is never coalesced back, so long bench
    // runs keep nibbling at the address space.
    let mut heap = new_heap(128 * 1024 * 1024);
    c.bench_function("fragmentation_workload", |b| {
        b.iter(|| {
            let mut rng = SimpleRng::new(0xDEAD_BEEF);
            let mut ptrs = Vec::with_capacity(128);

            // Allocate a batch of mixed sizes.
            for _ in 0..128 {
                let size = rng.range(24, 512);
                ptrs.push(heap.allocate(size).unwrap());
            }

            // Free every other one to punch holes.
            let mut survivors = Vec::with_capacity(64 + 64);
            for (i, p) in ptrs.into_iter().enumerate() {
                if i % 2 == 0 {
                    unsafe { heap.free(p) };
                } else {
                    survivors.push(p);
                }
            }

            // Refill; some land in holes, some grow the segment.
            for _ in 0..64 {
                let size = rng.range(24, 256);
                survivors.push(heap.allocate(size).unwrap());
            }

            for p in survivors {
                unsafe { heap.free(p) };
            }
        });
    });
}

criterion_group!(benches, bench_simple_cycle, bench_fragmentation);
criterion_main!(benches);
