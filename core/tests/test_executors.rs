#[cfg(test)]
mod executor_tests {
    use aes128_core::cipher::{encrypt_block, expand, RoundKeySchedule};
    use aes128_core::executor::{
        make_executor, Backend, Direction, Executor, ParallelCpuExecutor, SequentialExecutor,
    };
    use aes128_core::parallelism::ParallelismProfile;
    use aes128_core::segmenting::{segment, split, BlockSequence};
    use aes128_core::session::SessionConfig;
    use aes128_core::telemetry::{Stage, StageTimes};
    use aes128_core::types::CipherError;
    use proptest::prelude::*;

    fn fixture(len: usize) -> (BlockSequence, RoundKeySchedule) {
        let data: Vec<u8> = (0..len).map(|i| (i * 31 % 251) as u8).collect();
        let key: Vec<u8> = (0u8..16).collect();
        (segment(&data), expand(&key).unwrap())
    }

    #[test]
    fn sequential_matches_per_block_transform() {
        let (blocks, schedule) = fixture(100);
        let out = SequentialExecutor::new().apply(&blocks, &schedule, encrypt_block);
        assert_eq!(out.block_count(), blocks.len());
        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(out.slot(i), &encrypt_block(block, &schedule));
        }
    }

    #[test]
    fn parallel_matches_sequential_for_many_worker_counts() {
        let (blocks, schedule) = fixture(4096 + 7);
        let expected = SequentialExecutor::new().apply(&blocks, &schedule, encrypt_block);
        for workers in [1, 2, 3, 8, 64] {
            let out = ParallelCpuExecutor::new(workers)
                .unwrap()
                .apply(&blocks, &schedule, encrypt_block)
                .unwrap();
            assert_eq!(out, expected, "workers={workers}");
        }
    }

    #[test]
    fn more_workers_than_blocks_is_fine() {
        let (blocks, schedule) = fixture(5);
        assert_eq!(blocks.len(), 1);
        let out = ParallelCpuExecutor::new(16)
            .unwrap()
            .apply(&blocks, &schedule, encrypt_block)
            .unwrap();
        assert_eq!(out.slot(0), &encrypt_block(&blocks[0], &schedule));
    }

    #[test]
    fn empty_sequence_gives_empty_output() {
        let schedule = expand(&[0u8; 16]).unwrap();
        let blocks = BlockSequence::default();
        let out = ParallelCpuExecutor::new(4)
            .unwrap()
            .apply(&blocks, &schedule, encrypt_block)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(matches!(
            ParallelCpuExecutor::new(0),
            Err(CipherError::InvalidWorkerCount { requested: 0, .. })
        ));
        assert!(matches!(
            make_executor(Backend::ParallelCpu, &SessionConfig::with_workers(0)),
            Err(CipherError::InvalidWorkerCount { .. })
        ));
    }

    #[test]
    fn worker_panic_is_reported() {
        fn exploding(_: &[u8; 16], _: &RoundKeySchedule) -> [u8; 16] {
            panic!("boom");
        }
        let (blocks, schedule) = fixture(64);
        let err = ParallelCpuExecutor::new(2)
            .unwrap()
            .apply(&blocks, &schedule, exploding)
            .unwrap_err();
        assert!(matches!(err, CipherError::WorkerPanicked));
    }

    #[test]
    fn executors_charge_the_direction_stage() {
        let (blocks, schedule) = fixture(32);
        let mut exec = make_executor(Backend::Sequential, &SessionConfig::default()).unwrap();
        let mut times = StageTimes::default();
        exec.run(&blocks, &schedule, Direction::Decrypt, &mut times).unwrap();
        assert!(times.contains(Stage::Decrypt));
        assert!(!times.contains(Stage::Encrypt));
        assert_eq!(exec.backend(), Backend::Sequential);
    }

    #[test]
    fn factory_reports_worker_count() {
        let exec = make_executor(Backend::ParallelCpu, &SessionConfig::with_workers(3)).unwrap();
        assert_eq!(exec.backend(), Backend::ParallelCpu);
        assert_eq!(exec.workers(1_000), 3);
    }

    #[test]
    fn reported_workers_never_exceed_blocks() {
        let exec = ParallelCpuExecutor::new(8).unwrap();
        assert_eq!(exec.worker_count(), 8);
        assert_eq!(exec.workers(3), 3);
        assert_eq!(exec.workers(100), 8);
    }

    #[test]
    fn default_pool_matches_processor_count() {
        assert_eq!(
            ParallelCpuExecutor::with_default_workers().worker_count(),
            ParallelismProfile::resolve_workers(None).unwrap()
        );
    }

    #[test]
    fn backend_tags_parse() {
        assert_eq!("seq".parse::<Backend>().unwrap(), Backend::Sequential);
        assert_eq!("CPU".parse::<Backend>().unwrap(), Backend::ParallelCpu);
        assert_eq!("Gpu".parse::<Backend>().unwrap(), Backend::Accelerator);
        assert!("tpu".parse::<Backend>().is_err());
        assert_eq!(Backend::Accelerator.to_string(), "GPU");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_parallel_equals_sequential(
            data in proptest::collection::vec(any::<u8>(), 0..2048),
            key in any::<[u8; 16]>(),
            workers in 1usize..12,
        ) {
            let blocks = segment(&data);
            let schedule = expand(&key).unwrap();
            let mut times = StageTimes::default();
            let seq = SequentialExecutor::new()
                .run(&blocks, &schedule, Direction::Encrypt, &mut times)
                .unwrap();
            let par = ParallelCpuExecutor::new(workers)
                .unwrap()
                .run(&blocks, &schedule, Direction::Encrypt, &mut times)
                .unwrap();
            prop_assert_eq!(seq, par);
        }

        #[test]
        fn prop_parallel_decrypt_equals_sequential(
            blocks in proptest::collection::vec(any::<[u8; 16]>(), 0..128),
            key in any::<[u8; 16]>(),
            workers in 1usize..12,
        ) {
            // Arbitrary blocks, not necessarily produced by encryption.
            let blocks = split(&blocks.concat()).unwrap();
            let schedule = expand(&key).unwrap();
            let mut times = StageTimes::default();
            let seq = SequentialExecutor::new()
                .run(&blocks, &schedule, Direction::Decrypt, &mut times)
                .unwrap();
            let par = ParallelCpuExecutor::new(workers)
                .unwrap()
                .run(&blocks, &schedule, Direction::Decrypt, &mut times)
                .unwrap();
            prop_assert_eq!(seq, par);
        }
    }
}
