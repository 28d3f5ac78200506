//! Calculator applications.
//!
//! [`BasicCalculatorPage`] drives the form-based testsheepnz calculator
//! (two number fields, an operation dropdown and a "build" selector that
//! switches between deliberately broken prototypes). [`SbecagolCalculatorPage`]
//! drives a button-pad calculator with keyboard support.

use crate::assertion::{Expect, TextMatch};
use crate::interaction::keys;
use crate::locator::{Locator, Selector};
use crate::page::PageHandle;
use crate::page_object::{BasePage, PageObject};
use crate::result::VitrineResult;

/// URL of the form-based calculator
pub const BASIC_CALCULATOR_URL: &str = "https://testsheepnz.github.io/BasicCalculator.html";

/// URL of the button-pad calculator
pub const SBECAGOL_CALCULATOR_URL: &str = "https://sbecagol.com/test-apps/calculator/";

/// Operations offered by the form-based calculator's dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `0`
    Add,
    /// `1`
    Subtract,
    /// `2`
    Multiply,
    /// `3`
    Divide,
    /// `4`, string concatenation of both fields
    Concatenate,
}

impl Operation {
    /// Value of the `<option>`
    #[must_use]
    pub const fn option_value(&self) -> &'static str {
        match self {
            Self::Add => "0",
            Self::Subtract => "1",
            Self::Multiply => "2",
            Self::Divide => "3",
            Self::Concatenate => "4",
        }
    }
}

/// testsheepnz "Basic Calculator"; elements carry their test id in `id`
#[derive(Debug, Clone)]
pub struct BasicCalculatorPage {
    base: BasePage,
    number1: Locator,
    number2: Locator,
    calculate: Locator,
    answer: Locator,
    operation: Locator,
    build: Locator,
    integers_only: Locator,
    clear: Locator,
    error: Locator,
}

impl PageObject for BasicCalculatorPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl BasicCalculatorPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        let by_id = |id: &str| page.select(Selector::test_id_attr("id", id));
        Self {
            number1: by_id("number1Field"),
            number2: by_id("number2Field"),
            calculate: by_id("calculateButton"),
            answer: by_id("numberAnswerField"),
            operation: by_id("selectOperationDropdown"),
            build: by_id("selectBuild"),
            integers_only: by_id("integerSelect"),
            clear: by_id("clearButton"),
            error: page.locator("h3"),
            base: BasePage::new(page, expect, BASIC_CALCULATOR_URL),
        }
    }

    /// First operand field
    #[must_use]
    pub const fn number1(&self) -> &Locator {
        &self.number1
    }

    /// Second operand field
    #[must_use]
    pub const fn number2(&self) -> &Locator {
        &self.number2
    }

    /// Result field
    #[must_use]
    pub const fn answer(&self) -> &Locator {
        &self.answer
    }

    /// Error message shown for non-numeric input
    #[must_use]
    pub const fn error_message(&self) -> &Locator {
        &self.error
    }

    /// Type into the first field
    pub async fn fill_number1(&self, value: &str) -> VitrineResult<()> {
        self.number1.fill(value).await
    }

    /// Type into the second field
    pub async fn fill_number2(&self, value: &str) -> VitrineResult<()> {
        self.number2.fill(value).await
    }

    /// Pick an operation
    pub async fn select_operation(&self, operation: Operation) -> VitrineResult<()> {
        self.operation.select_option(operation.option_value()).await
    }

    /// Pick a build (`"0"` is the production build, others are prototypes)
    pub async fn select_build(&self, build: &str) -> VitrineResult<()> {
        self.build.select_option(build).await
    }

    /// Toggle "Integers only"
    pub async fn set_integers_only(&self, on: bool) -> VitrineResult<()> {
        if on {
            self.integers_only.check().await
        } else {
            self.integers_only.uncheck().await
        }
    }

    /// Press "Calculate"
    pub async fn calculate(&self) -> VitrineResult<()> {
        self.calculate.click().await
    }

    /// Press "Clear"; only the answer field is cleared
    pub async fn clear(&self) -> VitrineResult<()> {
        self.clear.click().await
    }

    /// Fill both fields, pick the operation and calculate
    pub async fn compute(&self, a: &str, operation: Operation, b: &str) -> VitrineResult<()> {
        self.fill_number1(a).await?;
        self.fill_number2(b).await?;
        self.select_operation(operation).await?;
        self.calculate().await
    }

    /// The answer field holds `expected`
    pub async fn verify_result(&self, expected: impl Into<TextMatch>) -> VitrineResult<()> {
        self.base.expect().to_have_value(&self.answer, expected).await
    }

    /// The error message contains `expected`
    pub async fn verify_error(&self, expected: &str) -> VitrineResult<()> {
        self.base.expect().to_contain_text(&self.error, expected).await
    }
}

/// sbecagol.com button-pad calculator
#[derive(Debug, Clone)]
pub struct SbecagolCalculatorPage {
    base: BasePage,
    app: Locator,
    display: Locator,
    expression: Locator,
    digits: [Locator; 10],
    add: Locator,
    subtract: Locator,
    multiply: Locator,
    divide: Locator,
    equals: Locator,
    decimal: Locator,
    clear: Locator,
    backspace: Locator,
    percent: Locator,
    plus_minus: Locator,
    theme_toggle: Locator,
}

impl PageObject for SbecagolCalculatorPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl SbecagolCalculatorPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        let app = page.get_by_role("application", Some("Calculator"));
        let button = |name: &str| page.get_by_role_exact("button", name);
        Self {
            display: app.locator("> div:first-child > div:nth-child(2)"),
            expression: app.locator("> div:first-child > div:first-child"),
            digits: std::array::from_fn(|d| button(&d.to_string())),
            add: button("+"),
            subtract: button("\u{2212}"),
            multiply: button("\u{d7}"),
            divide: button("\u{f7}"),
            equals: button("="),
            decimal: button("."),
            clear: button("AC"),
            backspace: button("\u{232b}"),
            percent: button("%"),
            plus_minus: button("\u{b1}"),
            theme_toggle: page.get_by_role("button", Some("Toggle dark/light mode")),
            app,
            base: BasePage::new(page, expect, SBECAGOL_CALCULATOR_URL),
        }
    }

    /// Calculator container
    #[must_use]
    pub const fn app(&self) -> &Locator {
        &self.app
    }

    /// Main display
    #[must_use]
    pub const fn display(&self) -> &Locator {
        &self.display
    }

    /// Expression line above the display
    #[must_use]
    pub const fn expression(&self) -> &Locator {
        &self.expression
    }

    /// Trimmed display text
    pub async fn display_value(&self) -> VitrineResult<String> {
        Ok(self.display.text_content().await?.trim().to_string())
    }

    /// Trimmed expression text
    pub async fn expression_value(&self) -> VitrineResult<String> {
        Ok(self.expression.text_content().await?.trim().to_string())
    }

    /// Click one digit button; only the last decimal digit of `digit` counts
    pub async fn click_digit(&self, digit: u8) -> VitrineResult<()> {
        self.digits[usize::from(digit % 10)].click().await
    }

    /// Enter a number through the buttons.
    ///
    /// Digits click their button, `.` the decimal point and `-` the sign
    /// toggle; anything else is skipped.
    pub async fn enter_number(&self, value: &str) -> VitrineResult<()> {
        for c in value.chars() {
            match c {
                '0'..='9' => self.click_digit(c as u8 - b'0').await?,
                '.' => self.decimal.click().await?,
                '-' => self.plus_minus.click().await?,
                _ => tracing::debug!(skipped = %c, "no button for character"),
            }
        }
        Ok(())
    }

    /// Click "+"
    pub async fn click_add(&self) -> VitrineResult<()> {
        self.add.click().await
    }

    /// Click "−"
    pub async fn click_subtract(&self) -> VitrineResult<()> {
        self.subtract.click().await
    }

    /// Click "×"
    pub async fn click_multiply(&self) -> VitrineResult<()> {
        self.multiply.click().await
    }

    /// Click "÷"
    pub async fn click_divide(&self) -> VitrineResult<()> {
        self.divide.click().await
    }

    /// Click "="
    pub async fn click_equals(&self) -> VitrineResult<()> {
        self.equals.click().await
    }

    /// Click "."
    pub async fn click_decimal(&self) -> VitrineResult<()> {
        self.decimal.click().await
    }

    /// Click "AC"
    pub async fn click_clear(&self) -> VitrineResult<()> {
        self.clear.click().await
    }

    /// Click "⌫"; the keyboard Backspace navigates back on this app
    pub async fn click_backspace(&self) -> VitrineResult<()> {
        self.backspace.click().await
    }

    /// Click "%"
    pub async fn click_percent(&self) -> VitrineResult<()> {
        self.percent.click().await
    }

    /// Click "±"
    pub async fn click_plus_minus(&self) -> VitrineResult<()> {
        self.plus_minus.click().await
    }

    /// Switch between dark and light theme
    pub async fn toggle_theme(&self) -> VitrineResult<()> {
        self.theme_toggle.click().await
    }

    /// Focus the display and type an expression on the keyboard
    pub async fn type_expression(&self, expression: &str) -> VitrineResult<()> {
        self.display.click().await?;
        self.base.page().keyboard_type(expression).await
    }

    /// Focus the display and press Enter (evaluate)
    pub async fn press_enter(&self) -> VitrineResult<()> {
        self.display.click().await?;
        self.base.page().press_key(keys::ENTER).await
    }

    /// Focus the display and press Escape (clear)
    pub async fn press_escape(&self) -> VitrineResult<()> {
        self.display.click().await?;
        self.base.page().press_key(keys::ESCAPE).await
    }

    /// Display shows `expected`
    pub async fn expect_display_value(&self, expected: impl Into<TextMatch>) -> VitrineResult<()> {
        self.base.expect().to_have_text(&self.display, expected).await
    }

    /// Expression line shows `expected`
    pub async fn expect_expression_value(
        &self,
        expected: impl Into<TextMatch>,
    ) -> VitrineResult<()> {
        self.base.expect().to_have_text(&self.expression, expected).await
    }

    /// Display contains `text`
    pub async fn expect_display_contains(&self, text: &str) -> VitrineResult<()> {
        self.base.expect().to_contain_text(&self.display, text).await
    }
}
