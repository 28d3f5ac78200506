use super::tags;
use crate::harness::{TestCase, TestSuite};
use crate::page_object::PageObject;
use crate::sites::names;
use crate::sites::qr_code::QrCodePage;
use crate::sites::todo::SbecagolTodoPage;
use crate::visual::ScreenshotComparator;

pub(super) fn visual() -> TestSuite {
    TestSuite::new("visual")
        .with_test(
            TestCase::new("qr code for a numeric payload", |ctx| async move {
                let qr = ctx.fixture::<QrCodePage>(names::QR_CODE)?;
                let screenshots = ctx.fixture::<ScreenshotComparator>(names::SCREENSHOTS)?;
                qr.navigate().await?;
                qr.generate("1234567890").await?;
                qr.verify_image_visible().await?;
                screenshots
                    .verify(&ctx.expect(), &ctx.page().locator("body"), "qr-code/1234567890")
                    .await
            })
            .uses(&[names::QR_CODE, names::SCREENSHOTS])
            .tag(tags::VISUAL),
        )
        .with_test(
            TestCase::new("todo app in dark and light mode", |ctx| async move {
                let todo = ctx.fixture::<SbecagolTodoPage>(names::SBECAGOL_TODO)?;
                let screenshots = ctx.fixture::<ScreenshotComparator>(names::SCREENSHOTS)?;
                let soft = ctx.soft();
                let body = ctx.page().locator("body");
                todo.navigate().await?;
                screenshots.verify(&soft, &body, "sbecagol-todo/body-dark").await?;
                screenshots
                    .verify(&soft, todo.app_region(), "sbecagol-todo/app-dark")
                    .await?;
                todo.toggle_theme().await?;
                screenshots.verify(&soft, &body, "sbecagol-todo/body-light").await?;
                screenshots
                    .verify(&soft, todo.app_region(), "sbecagol-todo/app-light")
                    .await
            })
            .uses(&[names::SBECAGOL_TODO, names::SCREENSHOTS])
            .tag(tags::VISUAL),
        )
}
