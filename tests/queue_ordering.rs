// tests/queue_ordering.rs

use proptest::prelude::*;
use teststream::runner::batching_queue;

proptest! {
    /// Whatever the interleaving, each producer's items come out of
    /// `drain_available` in the order that producer pushed them, and nothing
    /// is lost.
    #[test]
    fn drain_preserves_per_producer_order(
        per_producer in proptest::collection::vec(0usize..50, 1..6)
    ) {
        let (producer, mut consumer) = batching_queue::<(usize, usize)>();

        std::thread::scope(|scope| {
            for (p, &count) in per_producer.iter().enumerate() {
                let producer = producer.clone();
                scope.spawn(move || {
                    for seq in 0..count {
                        producer.push((p, seq));
                    }
                });
            }
        });

        let drained = consumer.drain_available();
        prop_assert_eq!(drained.len(), per_producer.iter().sum::<usize>());

        for (p, &count) in per_producer.iter().enumerate() {
            let seqs: Vec<usize> = drained
                .iter()
                .filter(|(producer, _)| *producer == p)
                .map(|(_, seq)| *seq)
                .collect();
            prop_assert_eq!(seqs, (0..count).collect::<Vec<_>>());
        }

        prop_assert!(consumer.drain_available().is_empty());
    }
}
