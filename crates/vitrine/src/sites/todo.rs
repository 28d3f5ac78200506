//! To-do list applications.
//!
//! [`TodoListPage`] is the TodoMVC-style list at todolist.james.am;
//! [`SbecagolTodoPage`] is the sbecagol.com list with a `N total • M active`
//! counter, filter buttons and a theme toggle.

use crate::assertion::Expect;
use crate::interaction::keys;
use crate::locator::Locator;
use crate::page::PageHandle;
use crate::page_object::{BasePage, PageObject};
use crate::result::VitrineResult;

/// URL of the TodoMVC-style list
pub const TODO_LIST_URL: &str = "https://todolist.james.am/#/";

/// URL of the sbecagol.com list
pub const SBECAGOL_TODO_URL: &str = "https://sbecagol.com/test-apps/todo-list/";

/// Which items a list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Every item
    All,
    /// Items not completed
    Active,
    /// Completed items
    Completed,
}

/// todolist.james.am
#[derive(Debug, Clone)]
pub struct TodoListPage {
    base: BasePage,
    input: Locator,
    items: Locator,
    clear_completed: Locator,
}

impl PageObject for TodoListPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl TodoListPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        Self {
            input: page.get_by_role("textbox", Some("What need's to be done?")),
            items: page.get_by_role("listitem", None),
            clear_completed: page.get_by_role("button", Some("Clear")),
            base: BasePage::new(page, expect, TODO_LIST_URL),
        }
    }

    /// Every list item currently shown
    #[must_use]
    pub const fn items(&self) -> &Locator {
        &self.items
    }

    /// List item containing `text`
    #[must_use]
    pub fn item(&self, text: &str) -> Locator {
        self.items.filter_has_text(text)
    }

    /// Type an item and submit it with Enter
    pub async fn add_item(&self, text: &str) -> VitrineResult<()> {
        self.input.click().await?;
        self.input.fill(text).await?;
        self.input.press(keys::ENTER).await
    }

    /// Tick the checkbox of the item containing `text`
    pub async fn complete(&self, text: &str) -> VitrineResult<()> {
        self.item(text).get_by_role("checkbox", None).check().await
    }

    /// Delete the item containing `text` with its "×" button
    pub async fn delete(&self, text: &str) -> VitrineResult<()> {
        let item = self.item(text);
        item.hover().await?;
        item.get_by_role("button", Some("\u{d7}")).click().await
    }

    /// Switch the footer filter
    pub async fn show(&self, filter: Filter) -> VitrineResult<()> {
        let name = match filter {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        };
        self.base.page().get_by_role("link", Some(name)).click().await
    }

    /// Remove every completed item
    pub async fn clear_completed(&self) -> VitrineResult<()> {
        self.clear_completed.click().await
    }

    /// Exactly `count` items are shown
    pub async fn verify_item_count(&self, count: usize) -> VitrineResult<()> {
        self.base.expect().to_have_count(&self.items, count).await
    }
}

/// sbecagol.com to-do list
#[derive(Debug, Clone)]
pub struct SbecagolTodoPage {
    base: BasePage,
    input: Locator,
    add_button: Locator,
    items: Locator,
    todos: Locator,
    completed: Locator,
    delete_buttons: Locator,
    toggles: Locator,
    clear_completed: Locator,
    theme_toggle: Locator,
    app_region: Locator,
    empty_state: Locator,
}

impl PageObject for SbecagolTodoPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl SbecagolTodoPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        Self {
            input: page.get_by_role("textbox", Some("New todo")),
            add_button: page.get_by_role("button", Some("Add")),
            items: page.get_by_role("listitem", None),
            todos: page.locator(".todo"),
            completed: page.locator(".completed"),
            delete_buttons: page.get_by_title("Delete"),
            toggles: page.get_by_label("Toggle completion"),
            clear_completed: page.get_by_role("button", Some("Clear completed")),
            theme_toggle: page.get_by_role("button", Some("Toggle dark/light mode")),
            app_region: page.get_by_role("region", Some("Todo app")),
            empty_state: page.get_by_text("No tasks yet. Add one above!"),
            base: BasePage::new(page, expect, SBECAGOL_TODO_URL),
        }
    }

    /// List items currently shown
    #[must_use]
    pub const fn items(&self) -> &Locator {
        &self.items
    }

    /// Every task, whatever the filter
    #[must_use]
    pub const fn todos(&self) -> &Locator {
        &self.todos
    }

    /// Completed tasks
    #[must_use]
    pub const fn completed(&self) -> &Locator {
        &self.completed
    }

    /// The application region
    #[must_use]
    pub const fn app_region(&self) -> &Locator {
        &self.app_region
    }

    /// Counter reading `{total} total • {active} active`
    #[must_use]
    pub fn counter(&self, total: usize, active: usize) -> Locator {
        self.base
            .page()
            .get_by_text(format!("{total} total \u{2022} {active} active"))
    }

    /// Type into the input without submitting
    pub async fn fill(&self, text: &str) -> VitrineResult<()> {
        self.input.fill(text).await
    }

    /// Type a task and press "Add"
    pub async fn add(&self, text: &str) -> VitrineResult<()> {
        self.fill(text).await?;
        self.add_button.click().await
    }

    /// Type a task and submit it with Enter
    pub async fn add_with_enter(&self, text: &str) -> VitrineResult<()> {
        self.fill(text).await?;
        self.input.press(keys::ENTER).await
    }

    /// Add `task1..=taskN`
    pub async fn add_numbered(&self, count: usize) -> VitrineResult<()> {
        for i in 1..=count {
            self.add(&format!("task{i}")).await?;
        }
        Ok(())
    }

    /// Toggle completion of the n-th shown task
    pub async fn toggle_nth(&self, index: usize) -> VitrineResult<()> {
        self.toggles.nth(index).click().await
    }

    /// Delete the n-th shown task
    pub async fn delete_nth(&self, index: usize) -> VitrineResult<()> {
        self.delete_buttons.nth(index).click().await
    }

    /// Switch the filter
    pub async fn show(&self, filter: Filter) -> VitrineResult<()> {
        let page = self.base.page();
        let button = match filter {
            Filter::All => page.get_by_role_exact("button", "All"),
            Filter::Active => page.get_by_role("button", Some("Active")),
            Filter::Completed => page.get_by_role_exact("button", "Completed"),
        };
        button.click().await
    }

    /// Remove every completed task
    pub async fn clear_completed(&self) -> VitrineResult<()> {
        self.clear_completed.click().await
    }

    /// Flip between dark and light theme
    pub async fn toggle_theme(&self) -> VitrineResult<()> {
        self.theme_toggle.click().await
    }

    /// Exactly `count` list items are shown
    pub async fn verify_item_count(&self, count: usize) -> VitrineResult<()> {
        self.base.expect().to_have_count(&self.items, count).await
    }

    /// Exactly `count` tasks are completed
    pub async fn verify_completed_count(&self, count: usize) -> VitrineResult<()> {
        self.base.expect().to_have_count(&self.completed, count).await
    }

    /// The counter reads `{total} total • {active} active`
    pub async fn verify_counter(&self, total: usize, active: usize) -> VitrineResult<()> {
        self.base
            .expect()
            .to_be_visible(&self.counter(total, active))
            .await
    }

    /// The empty-list message is shown
    pub async fn verify_empty_state(&self) -> VitrineResult<()> {
        self.base.expect().to_be_visible(&self.empty_state).await
    }

    /// The input was cleared after adding
    pub async fn verify_input_empty(&self) -> VitrineResult<()> {
        self.base.expect().to_have_value(&self.input, "").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDom, MockDriver, MockElement};
    use crate::locator::Selector;
    use crate::wait::Timeouts;
    use std::sync::{Arc, Mutex};

    fn handle(driver: &MockDriver) -> PageHandle {
        PageHandle::new(Arc::new(driver.clone())).with_timeouts(Timeouts::immediate())
    }

    mod todo_list_tests {
        use super::*;

        #[tokio::test]
        async fn test_add_item_clicks_fills_then_presses_enter() {
            let driver = MockDriver::new();
            let input = Selector::role("textbox", Some("What need's to be done?"));
            driver.add(&input, MockElement::input(""));
            let items = Selector::role("listitem", None);
            driver.on_key(keys::ENTER, move |dom| {
                dom.set(&items, vec![MockElement::new("li", "test1")]);
            });

            let page = TodoListPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            page.add_item("test1").await.unwrap();
            page.verify_item_count(1).await.unwrap();

            let history = driver.call_history();
            let calls: Vec<&str> = history
                .iter()
                .map(String::as_str)
                .filter(|c| !c.starts_with("query:") && c.contains("What need"))
                .collect();
            assert_eq!(calls.len(), 3);
            assert!(calls[0].starts_with("click:"));
            assert!(calls[1].starts_with("fill:"));
            assert!(calls[2].starts_with("press:"));
        }

        #[tokio::test]
        async fn test_complete_targets_checkbox_inside_item() {
            let driver = MockDriver::new();
            let page = TodoListPage::new(handle(&driver), Expect::new());
            let checkbox = page.item("test2").get_by_role("checkbox", None);
            driver.add(checkbox.selector(), MockElement::checkbox());
            page.navigate().await.unwrap();
            page.complete("test2").await.unwrap();
            assert!(driver.was_called(&format!("check:{}", checkbox.selector())));
        }

        #[tokio::test]
        async fn test_complete_missing_item_is_not_found() {
            let driver = MockDriver::new();
            let page = TodoListPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            let err = page.complete("nope").await.unwrap_err();
            assert!(err.is_interaction());
        }
    }

    mod sbecagol_tests {
        use super::*;

        /// Scripted list: Add appends an item and keeps `.todo` and the counter in step
        fn scripted(driver: &MockDriver) {
            let input = Selector::role("textbox", Some("New todo"));
            let add = Selector::role("button", Some("Add"));
            driver.add(&input, MockElement::input(""));
            driver.add(&add, MockElement::new("button", "Add"));
            let tasks = Arc::new(Mutex::new(Vec::<String>::new()));
            driver.on_click(&add, move |dom: &mut MockDom| {
                let text = dom.value(&input).unwrap_or_default();
                if text.trim().is_empty() {
                    return;
                }
                let mut tasks = tasks.lock().unwrap();
                tasks.push(text);
                let n = tasks.len();
                dom.set(
                    &Selector::role("listitem", None),
                    tasks.iter().map(|t| MockElement::new("li", t.clone())).collect(),
                );
                dom.set(
                    &Selector::css(".todo"),
                    tasks.iter().map(|t| MockElement::new("li", t.clone())).collect(),
                );
                let counter = |k: usize| format!("{k} total \u{2022} {k} active");
                dom.remove(&Selector::text(counter(n - 1)));
                dom.set(
                    &Selector::text(counter(n)),
                    vec![MockElement::new("span", counter(n))],
                );
                dom.set(&input, vec![MockElement::input("")]);
            });
        }

        #[tokio::test]
        async fn test_add_numbered_tasks_updates_counter() {
            let driver = MockDriver::new();
            scripted(&driver);
            let page = SbecagolTodoPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            page.add_numbered(3).await.unwrap();
            page.verify_item_count(3).await.unwrap();
            page.verify_counter(3, 3).await.unwrap();
            page.verify_input_empty().await.unwrap();
        }

        #[tokio::test]
        async fn test_whitespace_task_is_not_added() {
            let driver = MockDriver::new();
            scripted(&driver);
            let page = SbecagolTodoPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            page.add("   ").await.unwrap();
            page.verify_item_count(0).await.unwrap();
        }

        #[tokio::test]
        async fn test_toggle_and_delete_pick_nth_match() {
            let driver = MockDriver::new();
            let toggles = Selector::Label("Toggle completion".to_string());
            let deletes = Selector::Title("Delete".to_string());
            driver.with_dom(|dom| {
                dom.set(&toggles, (0..3).map(|_| MockElement::checkbox()).collect());
                dom.set(&deletes, (0..3).map(|_| MockElement::new("button", "")).collect());
            });
            let page = SbecagolTodoPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            page.toggle_nth(1).await.unwrap();
            page.delete_nth(2).await.unwrap();
            let history = driver.call_history();
            assert!(history.iter().any(|c| c.starts_with("click:") && c.ends_with("nth=1")));
            assert!(history.iter().any(|c| c.starts_with("click:") && c.ends_with("nth=2")));
        }

        #[tokio::test]
        async fn test_filter_buttons() {
            let driver = MockDriver::new();
            driver
                .add(&Selector::role_exact("button", "All"), MockElement::new("button", "All"))
                .add(&Selector::role("button", Some("Active")), MockElement::new("button", "Active"))
                .add(&Selector::role_exact("button", "Completed"), MockElement::new("button", "Completed"));
            let page = SbecagolTodoPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            for filter in [Filter::Active, Filter::Completed, Filter::All] {
                page.show(filter).await.unwrap();
            }
            assert_eq!(
                driver
                    .call_history()
                    .iter()
                    .filter(|c| c.starts_with("click:"))
                    .count(),
                3
            );
        }

        #[tokio::test]
        async fn test_stale_counter_is_assertion_failure() {
            let driver = MockDriver::new();
            driver.add(
                &Selector::text("1 total \u{2022} 1 active"),
                MockElement::new("span", "1 total \u{2022} 1 active"),
            );
            let page = SbecagolTodoPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            let err = page.verify_counter(0, 0).await.unwrap_err();
            assert!(err.is_assertion());
        }
    }
}
