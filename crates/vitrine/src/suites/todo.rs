use super::tags;
use crate::harness::{KnownBug, TestCase, TestSuite};
use crate::page_object::PageObject;
use crate::sites::names;
use crate::sites::todo::{Filter, SbecagolTodoPage, TodoListPage};

/// The james.am list renders after a short delay
const SETTLE_SECONDS: f64 = 0.5;

pub(super) fn todo_list() -> TestSuite {
    TestSuite::new("todo-list")
        .with_test(
            TestCase::new("add, complete, filter and clear items", |ctx| async move {
                let todo = ctx.fixture::<TodoListPage>(names::TODO_LIST)?;
                todo.navigate().await?;
                ctx.page().wait(SETTLE_SECONDS).await;
                for item in ["test1", "test2", "test3", "more test", "test qaz"] {
                    todo.add_item(item).await?;
                }
                todo.verify_item_count(5).await?;
                todo.complete("test1").await?;
                todo.complete("test2").await?;
                todo.show(Filter::Active).await?;
                todo.verify_item_count(3).await?;
                todo.show(Filter::Completed).await?;
                todo.verify_item_count(2).await?;
                todo.clear_completed().await?;
                todo.show(Filter::All).await?;
                todo.verify_item_count(3).await?;
                todo.delete("more test").await?;
                todo.verify_item_count(2).await
            })
            .uses(&[names::TODO_LIST])
            .tag(tags::E2E),
        )
}

pub(super) fn sbecagol_todo() -> TestSuite {
    TestSuite::new("sbecagol-todo")
        .with_test(
            TestCase::new("counter resets after deleting every task", |ctx| async move {
                let todo = ctx.fixture::<SbecagolTodoPage>(names::SBECAGOL_TODO)?;
                todo.navigate().await?;
                todo.add_numbered(3).await?;
                todo.verify_item_count(3).await?;
                todo.verify_counter(3, 3).await?;
                for _ in 0..3 {
                    todo.delete_nth(0).await?;
                }
                todo.verify_item_count(0).await?;
                todo.verify_empty_state().await?;
                todo.verify_counter(0, 0).await
            })
            .uses(&[names::SBECAGOL_TODO])
            .tag(tags::REGRESSION)
            .known_bug(
                KnownBug::new("counter keeps showing \"1 total \u{2022} 1 active\" once the list is empty")
                    .with_reference("BUG #1"),
            ),
        )
        .with_test(
            TestCase::new("add with the button", |ctx| async move {
                let todo = ctx.fixture::<SbecagolTodoPage>(names::SBECAGOL_TODO)?;
                todo.navigate().await?;
                todo.add("Buy groceries").await?;
                todo.verify_item_count(1).await?;
                ctx.expect()
                    .to_contain_text(&todo.todos().first(), "Buy groceries")
                    .await
            })
            .uses(&[names::SBECAGOL_TODO])
            .tag(tags::SMOKE),
        )
        .with_test(
            TestCase::new("add with Enter clears the input", |ctx| async move {
                let todo = ctx.fixture::<SbecagolTodoPage>(names::SBECAGOL_TODO)?;
                todo.navigate().await?;
                todo.add_with_enter("Write documentation").await?;
                todo.verify_item_count(1).await?;
                todo.verify_input_empty().await
            })
            .uses(&[names::SBECAGOL_TODO])
            .tag(tags::SMOKE),
        )
        .with_test(
            TestCase::new("delete tasks one by one", |ctx| async move {
                let todo = ctx.fixture::<SbecagolTodoPage>(names::SBECAGOL_TODO)?;
                todo.navigate().await?;
                todo.add_numbered(3).await?;
                for remaining in [2, 1] {
                    todo.delete_nth(0).await?;
                    todo.verify_item_count(remaining).await?;
                }
                Ok(())
            })
            .uses(&[names::SBECAGOL_TODO])
            .tag(tags::REGRESSION),
        )
        .with_test(
            TestCase::new("toggle completion", |ctx| async move {
                let todo = ctx.fixture::<SbecagolTodoPage>(names::SBECAGOL_TODO)?;
                todo.navigate().await?;
                todo.add("Review code").await?;
                todo.verify_completed_count(0).await?;
                todo.toggle_nth(0).await?;
                todo.verify_completed_count(1).await?;
                todo.toggle_nth(0).await?;
                todo.verify_completed_count(0).await
            })
            .uses(&[names::SBECAGOL_TODO])
            .tag(tags::REGRESSION),
        )
        .with_test(
            TestCase::new("filters and clear completed", |ctx| async move {
                let todo = ctx.fixture::<SbecagolTodoPage>(names::SBECAGOL_TODO)?;
                todo.navigate().await?;
                todo.add_numbered(3).await?;
                todo.toggle_nth(0).await?;
                todo.verify_counter(3, 2).await?;
                todo.show(Filter::Active).await?;
                todo.verify_item_count(2).await?;
                todo.show(Filter::Completed).await?;
                todo.verify_item_count(1).await?;
                todo.show(Filter::All).await?;
                todo.clear_completed().await?;
                todo.verify_item_count(2).await
            })
            .uses(&[names::SBECAGOL_TODO])
            .tag(tags::REGRESSION),
        )
        .with_test(
            TestCase::new("theme toggle keeps the tasks", |ctx| async move {
                let todo = ctx.fixture::<SbecagolTodoPage>(names::SBECAGOL_TODO)?;
                todo.navigate().await?;
                todo.add("Stay visible").await?;
                todo.toggle_theme().await?;
                ctx.expect().to_be_visible(todo.app_region()).await?;
                todo.verify_item_count(1).await
            })
            .uses(&[names::SBECAGOL_TODO])
            .tag(tags::REGRESSION),
        )
}
