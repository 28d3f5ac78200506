use super::tags;
use crate::harness::{KnownBug, TestCase, TestContext, TestSuite};
use crate::page_object::PageObject;
use crate::result::VitrineResult;
use crate::sites::calculator::{BasicCalculatorPage, Operation, SbecagolCalculatorPage};
use crate::sites::names;

/// Prototype builds offered by the basic calculator's build dropdown
const BUILDS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// `(name, first, operation, second, expected answer)`
const OPERATIONS: [(&str, &str, Operation, &str, &str); 7] = [
    ("add 5 and 5", "5", Operation::Add, "5", "10"),
    ("subtract 4 from 8", "8", Operation::Subtract, "4", "4"),
    ("multiply 8 with 4", "8", Operation::Multiply, "4", "32"),
    ("divide 10 by 2", "10", Operation::Divide, "2", "5"),
    ("concatenate 10 and 2", "10", Operation::Concatenate, "2", "102"),
    ("add zero to zero", "0", Operation::Add, "0", "0"),
    ("multiply by zero", "7", Operation::Multiply, "0", "0"),
];

/// `(name, first, operation, second, expected error)`
const INVALID_INPUTS: [(&str, &str, Operation, &str, &str); 3] = [
    ("error for non-numeric first field", "abc", Operation::Add, "5", "Number 1 is not a number"),
    ("error for non-numeric second field", "5", Operation::Add, "abc", "Number 2 is not a number"),
    ("error for division by zero", "10", Operation::Divide, "0", "Divide by zero error!"),
];

async fn open_build(ctx: &TestContext, build: &str) -> VitrineResult<()> {
    let calc = ctx.fixture::<BasicCalculatorPage>(names::BASIC_CALCULATOR)?;
    calc.navigate().await?;
    calc.select_build(build).await
}

pub(super) fn basic() -> TestSuite {
    let mut suite = TestSuite::new("basic-calculator");
    for build in BUILDS {
        for (name, a, operation, b, expected) in OPERATIONS {
            suite.add_test(
                TestCase::new(format!("{name} on build {build}"), move |ctx| async move {
                    open_build(&ctx, build).await?;
                    let calc = ctx.fixture::<BasicCalculatorPage>(names::BASIC_CALCULATOR)?;
                    calc.compute(a, operation, b).await?;
                    calc.verify_result(expected).await
                })
                .uses(&[names::BASIC_CALCULATOR])
                .tag(tags::SMOKE),
            );
        }
        for (name, a, operation, b, error) in INVALID_INPUTS {
            let mut test = TestCase::new(format!("{name} on build {build}"), move |ctx| async move {
                open_build(&ctx, build).await?;
                let calc = ctx.fixture::<BasicCalculatorPage>(names::BASIC_CALCULATOR)?;
                calc.compute(a, operation, b).await?;
                calc.verify_error(error).await
            })
            .uses(&[names::BASIC_CALCULATOR])
            .tag(tags::NEGATIVE);
            if build != "0" {
                test = test.known_bug(KnownBug::new(format!(
                    "build {build} does not validate input before calculating"
                )));
            }
            suite.add_test(test);
        }
    }
    suite.add_test(
        TestCase::new("integers only truncates the answer", |ctx| async move {
            open_build(&ctx, "0").await?;
            let calc = ctx.fixture::<BasicCalculatorPage>(names::BASIC_CALCULATOR)?;
            calc.compute("7", Operation::Divide, "2").await?;
            calc.verify_result("3.5").await?;
            calc.set_integers_only(true).await?;
            calc.calculate().await?;
            calc.verify_result("3").await
        })
        .uses(&[names::BASIC_CALCULATOR])
        .tag(tags::REGRESSION),
    );
    suite.add_test(
        TestCase::new("clear empties the answer", |ctx| async move {
            open_build(&ctx, "0").await?;
            let calc = ctx.fixture::<BasicCalculatorPage>(names::BASIC_CALCULATOR)?;
            calc.compute("1", Operation::Add, "1").await?;
            calc.verify_result("2").await?;
            calc.clear().await?;
            calc.verify_result("").await
        })
        .uses(&[names::BASIC_CALCULATOR])
        .tag(tags::REGRESSION),
    );
    suite
}

/// Operator buttons of the button-pad calculator
#[derive(Debug, Clone, Copy)]
enum Key {
    Add,
    Subtract,
    Multiply,
    Divide,
}

async fn press(calc: &SbecagolCalculatorPage, key: Key) -> VitrineResult<()> {
    match key {
        Key::Add => calc.click_add().await,
        Key::Subtract => calc.click_subtract().await,
        Key::Multiply => calc.click_multiply().await,
        Key::Divide => calc.click_divide().await,
    }
}

/// Open the calculator and evaluate `a key b` through the buttons
async fn evaluate(calc: &SbecagolCalculatorPage, a: &str, key: Key, b: &str) -> VitrineResult<()> {
    calc.navigate().await?;
    calc.enter_number(a).await?;
    press(calc, key).await?;
    calc.enter_number(b).await?;
    calc.click_equals().await
}

fn arithmetic(
    name: &str,
    a: &'static str,
    key: Key,
    b: &'static str,
    expected: &'static str,
) -> TestCase {
    TestCase::new(name, move |ctx| async move {
        let calc = ctx.fixture::<SbecagolCalculatorPage>(names::SBECAGOL_CALCULATOR)?;
        evaluate(calc, a, key, b).await?;
        calc.expect_display_value(expected).await
    })
    .uses(&[names::SBECAGOL_CALCULATOR])
    .tag(tags::SMOKE)
}

fn uses_calculator(test: TestCase) -> TestCase {
    test.uses(&[names::SBECAGOL_CALCULATOR])
}

pub(super) fn sbecagol() -> TestSuite {
    TestSuite::new("sbecagol-calculator")
        .with_test(arithmetic("adds two positive numbers", "7", Key::Add, "8", "15"))
        .with_test(arithmetic("subtracts two numbers", "9", Key::Subtract, "4", "5"))
        .with_test(arithmetic("multiplies two numbers", "6", Key::Multiply, "7", "42"))
        .with_test(arithmetic("divides two numbers", "8", Key::Divide, "2", "4"))
        .with_test(arithmetic("handles negative results", "3", Key::Subtract, "8", "-5"))
        .with_test(arithmetic("handles decimal inputs", "1.5", Key::Add, "2.5", "4"))
        .with_test(
            uses_calculator(TestCase::new("division by zero shows an error", |ctx| async move {
                let calc = ctx.fixture::<SbecagolCalculatorPage>(names::SBECAGOL_CALCULATOR)?;
                evaluate(calc, "5", Key::Divide, "0").await?;
                let display = calc.display_value().await?;
                ctx.expect()
                    .is_true(!display.contains("NaN"), "display shows an error instead of NaN")
            }))
            .tag(tags::REGRESSION)
            .known_bug(
                KnownBug::new("division by zero displays NaN").with_reference("BUG #1"),
            ),
        )
        .with_test(
            uses_calculator(TestCase::new("recovers after NaN", |ctx| async move {
                let calc = ctx.fixture::<SbecagolCalculatorPage>(names::SBECAGOL_CALCULATOR)?;
                evaluate(calc, "5", Key::Divide, "0").await?;
                calc.click_clear().await?;
                calc.enter_number("2").await?;
                calc.click_add().await?;
                calc.enter_number("2").await?;
                calc.click_equals().await?;
                calc.expect_display_value("4").await
            }))
            .tag(tags::REGRESSION),
        )
        .with_test(
            uses_calculator(TestCase::new(
                "multiplication binds tighter than addition",
                |ctx| async move {
                    let calc =
                        ctx.fixture::<SbecagolCalculatorPage>(names::SBECAGOL_CALCULATOR)?;
                    calc.navigate().await?;
                    calc.enter_number("2").await?;
                    calc.click_add().await?;
                    calc.enter_number("3").await?;
                    calc.click_multiply().await?;
                    calc.enter_number("4").await?;
                    calc.click_equals().await?;
                    calc.expect_display_value("14").await
                },
            ))
            .tag(tags::REGRESSION)
            .known_bug(
                KnownBug::new("operators are evaluated left to right").with_reference("BUG #2"),
            ),
        )
        .with_test(
            uses_calculator(TestCase::new("0.1 + 0.2 shows 0.3", |ctx| async move {
                let calc = ctx.fixture::<SbecagolCalculatorPage>(names::SBECAGOL_CALCULATOR)?;
                evaluate(calc, "0.1", Key::Add, "0.2").await?;
                calc.expect_display_value("0.3").await
            }))
            .tag(tags::REGRESSION)
            .known_bug(
                KnownBug::new("results show raw floating-point error")
                    .with_reference("BUG #3"),
            ),
        )
        .with_test(
            uses_calculator(TestCase::new("AC resets the display", |ctx| async move {
                let calc = ctx.fixture::<SbecagolCalculatorPage>(names::SBECAGOL_CALCULATOR)?;
                calc.navigate().await?;
                calc.enter_number("123").await?;
                calc.click_clear().await?;
                calc.expect_display_value("0").await
            }))
            .tag(tags::SMOKE),
        )
        .with_test(
            uses_calculator(TestCase::new("backspace deletes the last digit", |ctx| async move {
                let calc = ctx.fixture::<SbecagolCalculatorPage>(names::SBECAGOL_CALCULATOR)?;
                calc.navigate().await?;
                calc.enter_number("123").await?;
                calc.click_backspace().await?;
                calc.expect_display_value("12").await
            }))
            .tag(tags::REGRESSION),
        )
        .with_test(
            uses_calculator(TestCase::new("percent converts to a fraction", |ctx| async move {
                let calc = ctx.fixture::<SbecagolCalculatorPage>(names::SBECAGOL_CALCULATOR)?;
                calc.navigate().await?;
                calc.enter_number("50").await?;
                calc.click_percent().await?;
                calc.expect_display_value("0.5").await
            }))
            .tag(tags::REGRESSION),
        )
        .with_test(
            uses_calculator(TestCase::new("plus/minus toggles the sign", |ctx| async move {
                let calc = ctx.fixture::<SbecagolCalculatorPage>(names::SBECAGOL_CALCULATOR)?;
                calc.navigate().await?;
                calc.enter_number("5").await?;
                calc.click_plus_minus().await?;
                calc.expect_display_value("-5").await
            }))
            .tag(tags::REGRESSION),
        )
        .with_test(
            uses_calculator(TestCase::new("second decimal point is ignored", |ctx| async move {
                let calc = ctx.fixture::<SbecagolCalculatorPage>(names::SBECAGOL_CALCULATOR)?;
                calc.navigate().await?;
                calc.enter_number("1.2").await?;
                calc.click_decimal().await?;
                calc.enter_number("3").await?;
                calc.expect_display_value("1.23").await
            }))
            .tag(tags::REGRESSION),
        )
        .with_test(
            uses_calculator(TestCase::new("keyboard input with Enter", |ctx| async move {
                let calc = ctx.fixture::<SbecagolCalculatorPage>(names::SBECAGOL_CALCULATOR)?;
                calc.navigate().await?;
                calc.type_expression("12+3").await?;
                calc.press_enter().await?;
                calc.expect_display_value("15").await
            }))
            .tag(tags::REGRESSION),
        )
        .with_test(
            uses_calculator(TestCase::new("Escape clears", |ctx| async move {
                let calc = ctx.fixture::<SbecagolCalculatorPage>(names::SBECAGOL_CALCULATOR)?;
                calc.navigate().await?;
                calc.type_expression("99").await?;
                calc.press_escape().await?;
                calc.expect_display_value("0").await
            }))
            .tag(tags::REGRESSION),
        )
}
