use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use recorder_workflow::models::{
    NewWorkflowTask, Transaction, TransactionUid, WorkflowTask, WorkflowTaskMode, WorkflowUser,
};
use recorder_workflow::state_machine::{
    TransactionStatus, WorkflowCommandsAggregator, WorkflowRole, WorkflowRules,
};

fn selection(size: usize) -> Vec<Transaction> {
    let at = Utc::now().naive_utc();
    (0..size)
        .map(|index| {
            let id = index as i64 + 1;
            let uid = TransactionUid::parse(&format!("TR-{id:06}")).expect("valid uid");
            let mut transaction = Transaction::new(id, uid, "Deed", "Notary");
            transaction.tasks.push(WorkflowTask::initial(id * 10, id, at));
            let status = TransactionStatus::IN_PROCESS[index % 2];
            transaction
                .append_task(
                    id * 10 + 1,
                    NewWorkflowTask {
                        event_name: "workflow.receive".to_string(),
                        mode: WorkflowTaskMode::Manual,
                        assigned_by_id: 1,
                        responsible_id: 1,
                        next_contact_id: None,
                        current_status: TransactionStatus::Payment,
                        next_status: status,
                        notes: String::new(),
                    },
                    at,
                )
                .expect("append");
            transaction
        })
        .collect()
}

fn benchmark_rules_lookup(c: &mut Criterion) {
    let rules = WorkflowRules::default();
    let user = WorkflowUser::new(1, "supervisor").with_roles(WorkflowRole::ALL);

    c.bench_function("rules_commands_for", |b| {
        b.iter(|| rules.commands_for(black_box(TransactionStatus::Revision), black_box(&user)))
    });
}

fn benchmark_aggregate(c: &mut Criterion) {
    let user = WorkflowUser::new(1, "control")
        .with_roles([WorkflowRole::ControlDesk, WorkflowRole::Supervisor]);
    let mut group = c.benchmark_group("aggregate_selection");

    for size in [1usize, 10, 200] {
        let transactions = selection(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &transactions, |b, transactions| {
            b.iter(|| {
                let mut aggregator = WorkflowCommandsAggregator::default();
                for transaction in transactions {
                    aggregator.aggregate(transaction, &user);
                }
                black_box(aggregator.applicable_commands())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_rules_lookup, benchmark_aggregate);
criterion_main!(benches);
