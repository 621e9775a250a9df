//! Property tests: ids stay unique and increasing across any mix of
//! admissions, removals, clears and resets; dispatch order respects tiers.

use proptest::prelude::*;

use batchq::{BatchProcessor, NewTask, ProcessorConfig, TaskId, TaskOptions, TaskPriority};

#[derive(Debug, Clone)]
enum Op {
    Add,
    AddBatch(usize),
    RemoveFirst,
    CancelLast,
    Clear,
    Reset,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Add),
        2 => (1_usize..4).prop_map(Op::AddBatch),
        1 => Just(Op::RemoveFirst),
        1 => Just(Op::CancelLast),
        1 => Just(Op::Clear),
        1 => Just(Op::Reset),
    ]
}

fn priority_strategy() -> impl Strategy<Value = TaskPriority> {
    prop_oneof![
        Just(TaskPriority::Low),
        Just(TaskPriority::Normal),
        Just(TaskPriority::High),
        Just(TaskPriority::Urgent),
    ]
}

proptest! {
    #[test]
    fn ids_are_strictly_increasing(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let processor = BatchProcessor::new(ProcessorConfig::default()).unwrap();
        let mut issued: Vec<TaskId> = Vec::new();

        for op in ops {
            match op {
                Op::Add => issued.push(processor.add_task("op", "a", "b", TaskOptions::default())),
                Op::AddBatch(n) => {
                    let batch = (0..n).map(|_| NewTask::new("op", "a", "b")).collect();
                    issued.extend(processor.add_tasks(batch));
                }
                Op::RemoveFirst => {
                    if let Some(task) = processor.get_all_tasks().first() {
                        prop_assert!(processor.remove_task(task.id));
                    }
                }
                Op::CancelLast => {
                    if let Some(task) = processor.get_all_tasks().last() {
                        processor.cancel_task(task.id);
                    }
                }
                Op::Clear => {
                    processor.clear_completed_tasks();
                }
                Op::Reset => processor.reset(),
            }
        }

        prop_assert!(issued.windows(2).all(|pair| pair[0] < pair[1]));
        let stored: Vec<TaskId> = processor.get_all_tasks().iter().map(|t| t.id).collect();
        prop_assert!(stored.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn queue_order_respects_tiers_then_fifo(priorities in prop::collection::vec(priority_strategy(), 1..30)) {
        let processor = BatchProcessor::new(ProcessorConfig::default()).unwrap();
        let ids: Vec<(TaskId, TaskPriority)> = priorities
            .iter()
            .map(|priority| {
                let id = processor.add_task(
                    "op",
                    "a",
                    "b",
                    TaskOptions::default().with_priority(*priority),
                );
                (id, *priority)
            })
            .collect();

        let mut expected = ids.clone();
        expected.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let expected: Vec<TaskId> = expected.into_iter().map(|(id, _)| id).collect();

        prop_assert_eq!(processor.queued_ids(), expected);
    }
}
