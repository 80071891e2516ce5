use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{BoxedIter, WikiResult};

pub struct MapReduceOp<M, R, A, K, V> {
    mapper: M,
    reducer: R,
    _phantom: PhantomData<fn(A) -> (K, V)>,
}

fn merge<K, V, R>(aggregates: &mut HashMap<K, V>, k: K, v: V, reducer: &R)
where
    K: Eq + Hash,
    R: Fn(&V, &V) -> V,
{
    match aggregates.entry(k) {
        Entry::Occupied(mut prev) => {
            let next = reducer(prev.get(), &v);
            *prev.get_mut() = next;
        }
        Entry::Vacant(vac) => {
            vac.insert(v);
        }
    }
}

impl<M, R, A, K, V, I> MapReduceOp<M, R, A, K, V>
where
    M: Sync + Fn(A) -> I,
    I: IntoIterator<Item = (K, V)>,
    R: Sync + Fn(&V, &V) -> V,
    A: Send,
    K: Send + Eq + Hash,
    V: Send,
{
    pub fn new_map_reduce(map: M, reduce: R) -> MapReduceOp<M, R, A, K, V> {
        MapReduceOp { mapper: map, reducer: reduce, _phantom: PhantomData }
    }

    /// Chunks are mapped and reduced locally on a pool of `1 + cpus`
    /// threads, then the partial results are merged pairwise.
    pub fn run(&self, chunks: Vec<BoxedIter<A>>) -> WikiResult<HashMap<K, V>> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1 + num_cpus::get()).build()?;
        let mapper = &self.mapper;
        let reducer = &self.reducer;
        Ok(pool.install(|| {
            chunks
                .into_par_iter()
                .map(|chunk| {
                    let mut aggregates = HashMap::new();
                    for item in chunk {
                        for (k, v) in mapper(item) {
                            merge(&mut aggregates, k, v, reducer);
                        }
                    }
                    aggregates
                })
                .reduce(HashMap::new, |mut left, right| {
                    for (k, v) in right {
                        merge(&mut left, k, v, reducer);
                    }
                    left
                })
        }))
    }

    pub fn map_reduce(map: M, reduce: R, chunks: Vec<BoxedIter<A>>) -> WikiResult<HashMap<K, V>> {
        MapReduceOp::new_map_reduce(map, reduce).run(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_across_chunks() {
        let chunks: Vec<BoxedIter<&str>> = vec![
            Box::new(vec!["P31 Q5", "P31 Q6"].into_iter()),
            Box::new(vec!["P279 Q1"].into_iter()),
            Box::new(Vec::<&str>::new().into_iter()),
            Box::new(vec!["P31 Q7", "P737 Q1"].into_iter()),
        ];
        let counts = MapReduceOp::map_reduce(
            |line: &str| line.split_whitespace().next().map(|p| (p.to_string(), 1usize)),
            |a: &usize, b: &usize| a + b,
            chunks,
        )
        .unwrap();
        assert_eq!(counts.len(), 3);
        assert_eq!(counts["P31"], 3);
        assert_eq!(counts["P279"], 1);
        assert_eq!(counts["P737"], 1);
    }

    #[test]
    fn more_chunks_than_threads() {
        let chunks: Vec<BoxedIter<usize>> = (0..64usize).map(|i| Box::new(vec![i % 4; 10].into_iter()) as BoxedIter<usize>).collect();
        let counts = MapReduceOp::map_reduce(|n: usize| Some((n, 1usize)), |a: &usize, b: &usize| a + b, chunks).unwrap();
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&c| c == 160));
    }
}
