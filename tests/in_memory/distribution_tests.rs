//! Task routing and least-loaded assignment.

use super::helpers::agent;
use rstest::{fixture, rstest};
use switchyard::message::domain::MessagePriority;
use switchyard::task::domain::{AgentCategory, RoutingTable, Task, WorkerStatus};
use switchyard::task::services::{AssignmentResult, TaskDistributor};

#[fixture]
fn distributor() -> TaskDistributor {
    let mut distributor = TaskDistributor::new(RoutingTable::default());
    for (id, category) in [
        ("exec-1", AgentCategory::TaskExecutor),
        ("exec-2", AgentCategory::TaskExecutor),
        ("qa-1", AgentCategory::QualityAssurance),
    ] {
        distributor
            .register_worker(agent(id), category)
            .expect("worker registers");
    }
    distributor
}

fn task(task_type: &str) -> Task {
    Task::new(task_type, "work item", MessagePriority::Normal).expect("valid task")
}

#[rstest]
fn busy_executors_overflow_until_they_complete_work(mut distributor: TaskDistributor) {
    let first_round: Vec<_> = (0..4)
        .map(|_| distributor.distribute(task("task_execution")))
        .collect();

    let mut assigned = Vec::new();
    for result in &first_round {
        if let AssignmentResult::Assigned { task_id, agent_id } = result {
            assigned.push((agent_id.clone(), *task_id));
        }
    }
    let mut workers: Vec<_> = assigned.iter().map(|(id, _)| id.to_string()).collect();
    workers.sort();
    assert_eq!(workers, vec!["exec-1".to_owned(), "exec-2".to_owned()]);
    let queued = first_round
        .iter()
        .filter(|result| result.assigned_to().is_none())
        .count();
    assert_eq!(queued, 2);
    assert_eq!(distributor.overflow().len(), 2);
    assert_eq!(
        distributor
            .worker(&agent("qa-1"))
            .expect("qa worker")
            .queued(),
        0
    );

    for (worker, task_id) in &assigned {
        distributor
            .complete_task(worker, *task_id)
            .expect("assigned task completes");
    }
    let second_round = distributor.redistribute_overflow();

    assert!(distributor.overflow().is_empty());
    let mut placed: Vec<_> = second_round
        .iter()
        .filter_map(AssignmentResult::assigned_to)
        .map(ToString::to_string)
        .collect();
    placed.sort();
    assert_eq!(placed, vec!["exec-1".to_owned(), "exec-2".to_owned()]);
}

#[rstest]
fn unknown_task_type_falls_back_to_executors(mut distributor: TaskDistributor) {
    let result = distributor.distribute(task("mystery"));

    assert!(matches!(result, AssignmentResult::Assigned { .. }));
    assert!(
        result
            .assigned_to()
            .is_some_and(|id| id.as_str().starts_with("exec-"))
    );
}

#[rstest]
fn overflow_is_drained_once_a_worker_frees_up(mut distributor: TaskDistributor) {
    distributor
        .set_worker_status(&agent("qa-1"), WorkerStatus::Offline)
        .expect("known worker");

    let parked = distributor.distribute(task("quality_assurance"));
    assert!(matches!(
        parked,
        AssignmentResult::Queued {
            category: AgentCategory::QualityAssurance,
            ..
        }
    ));
    assert_eq!(distributor.overflow().len(), 1);

    distributor
        .set_worker_status(&agent("qa-1"), WorkerStatus::Active)
        .expect("known worker");
    let results = distributor.redistribute_overflow();

    assert!(distributor.overflow().is_empty());
    assert_eq!(
        results
            .iter()
            .filter_map(AssignmentResult::assigned_to)
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        vec!["qa-1".to_owned()]
    );
}
