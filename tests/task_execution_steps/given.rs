//! Given steps for task execution BDD scenarios.

use super::world::{TaskExecutionWorld, UnavailableLogRepository, run_async};
use eyre::WrapErr;
use foreman::execution::ports::CompletionError;
use foreman::task::domain::{ProjectId, Task};
use mockable::DefaultClock;
use rstest_bdd_macros::given;
use serde_json::json;
use std::sync::Arc;

#[given(r#"a task titled "{title}""#)]
fn task_titled(world: &mut TaskExecutionWorld, title: String) -> Result<(), eyre::Report> {
    let task = Task::new(ProjectId::new(), title, &DefaultClock)?;
    run_async(world.tasks.store(&task)).wrap_err("store scenario task")?;
    world.task = Some(task);
    Ok(())
}

#[given(r#"the model classifies the task as "{category}""#)]
fn model_classifies(world: &mut TaskExecutionWorld, category: String) {
    world.completion.push(Ok(category));
}

#[given("the model fails the classification request")]
fn model_fails_classification(world: &mut TaskExecutionWorld) {
    world.completion.push(Err(CompletionError::Provider {
        status: 503,
        body: "overloaded".to_owned(),
    }));
}

#[given("the model plans {count:u64} steps")]
fn model_plans_steps(world: &mut TaskExecutionWorld, count: u64) {
    let steps: Vec<_> = (1..=count)
        .map(|position| {
            json!({
                "id": position.to_string(),
                "description": format!("Step number {position}"),
                "tool": "exec",
                "estimatedDuration": 1,
            })
        })
        .collect();
    world
        .completion
        .push(Ok(json!({ "steps": steps }).to_string()));
}

#[given("the model plans a single step lasting {millis:u64} milliseconds")]
fn model_plans_long_step(world: &mut TaskExecutionWorld, millis: u64) {
    let plan = json!({
        "steps": [{
            "id": "1",
            "description": "Long running step",
            "tool": "exec",
            "estimatedDuration": millis,
        }],
    });
    world.completion.push(Ok(plan.to_string()));
}

#[given(r#"the model answers the planning request with "{answer}""#)]
fn model_answers_planning(world: &mut TaskExecutionWorld, answer: String) {
    world.completion.push(Ok(answer));
}

#[given("the execution log store is unavailable")]
fn log_store_unavailable(world: &mut TaskExecutionWorld) {
    world.logs = Arc::new(UnavailableLogRepository);
}
