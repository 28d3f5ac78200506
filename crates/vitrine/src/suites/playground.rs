use super::tags;
use crate::harness::{TestCase, TestSuite};
use crate::page_object::PageObject;
use crate::sites::names;
use crate::sites::qa_playground::{
    DynamicTablePage, Hero, OnboardingModalPage, RateStarsPage, ShadowDomPage, TagsPage,
    VerifyAccountPage, RATING_CAPTIONS,
};

/// Bar width once the boost animation finishes
const BOOSTED_WIDTH: &str = "width: 95%;";

/// Rows the superhero table always renders
const HERO_ROWS: usize = 8;

const TABLE_HEADERS: [&str; 3] = ["Superhero", "Status", "Real Name"];

const HEROES: [Hero; 3] = [
    Hero {
        name: "Spider-Man",
        email: "spider-man@avengers.com",
        status: "Active",
        real_name: "Peter Parker",
    },
    Hero {
        name: "Iron Man",
        email: "iron-man@avengers.com",
        status: "Active",
        real_name: "Tony Stark",
    },
    Hero {
        name: "Hulk",
        email: "hulk@avengers.com",
        status: "Active",
        real_name: "Bruce Banner",
    },
];

/// The tag box accepts ten tags
const PEOPLE: [&str; 10] = [
    "Ada Lovelace",
    "Alan Turing",
    "Grace Hopper",
    "Linus Torvalds",
    "Margaret Hamilton",
    "Dennis Ritchie",
    "Barbara Liskov",
    "Ken Thompson",
    "Edsger Dijkstra",
    "Donald Knuth",
];

pub(super) fn rate_stars() -> TestSuite {
    let mut suite = TestSuite::new("rate-stars");
    for (i, caption) in RATING_CAPTIONS.into_iter().enumerate() {
        let stars = i + 1;
        suite.add_test(
            TestCase::new(format!("{stars} star(s) show \"{caption}\""), move |ctx| async move {
                let page = ctx.fixture::<RateStarsPage>(names::RATE_STARS)?;
                page.navigate().await?;
                page.rate(stars).await?;
                page.verify_caption(caption).await?;
                page.verify_score(&format!("{stars} out of 5")).await
            })
            .uses(&[names::RATE_STARS])
            .tag(tags::REGRESSION),
        );
    }
    suite
}

pub(super) fn shadow_dom() -> TestSuite {
    TestSuite::new("shadow-dom").with_test(
        TestCase::new("boost fills the progress bar", |ctx| async move {
            let page = ctx.fixture::<ShadowDomPage>(names::SHADOW_DOM)?;
            page.navigate().await?;
            page.boost().await?;
            page.verify_progress(BOOSTED_WIDTH).await
        })
        .uses(&[names::SHADOW_DOM])
        .tag(tags::SMOKE),
    )
}

pub(super) fn dynamic_table() -> TestSuite {
    let mut suite = TestSuite::new("dynamic-table")
        .with_test(
            TestCase::new("headers", |ctx| async move {
                let table = ctx.fixture::<DynamicTablePage>(names::DYNAMIC_TABLE)?;
                table.navigate().await?;
                table.verify_headers(&TABLE_HEADERS).await
            })
            .uses(&[names::DYNAMIC_TABLE])
            .tag(tags::SMOKE),
        )
        .with_test(
            TestCase::new("row count", |ctx| async move {
                let table = ctx.fixture::<DynamicTablePage>(names::DYNAMIC_TABLE)?;
                table.navigate().await?;
                table.verify_row_count(HERO_ROWS).await
            })
            .uses(&[names::DYNAMIC_TABLE])
            .tag(tags::REGRESSION),
        )
        .with_test(
            TestCase::new("head and body shown", |ctx| async move {
                let table = ctx.fixture::<DynamicTablePage>(names::DYNAMIC_TABLE)?;
                table.navigate().await?;
                table.verify_table_visible().await
            })
            .uses(&[names::DYNAMIC_TABLE])
            .tag(tags::SMOKE),
        );
    for hero in &HEROES {
        suite.add_test(
            TestCase::new(format!("{} has the right email", hero.name), move |ctx| async move {
                let table = ctx.fixture::<DynamicTablePage>(names::DYNAMIC_TABLE)?;
                table.navigate().await?;
                table.verify_hero_cell(hero).await
            })
            .uses(&[names::DYNAMIC_TABLE])
            .tag(tags::REGRESSION),
        );
        suite.add_test(
            TestCase::new(format!("{} row is complete", hero.name), move |ctx| async move {
                let table = ctx.fixture::<DynamicTablePage>(names::DYNAMIC_TABLE)?;
                table.navigate().await?;
                table.verify_hero_row(hero).await
            })
            .uses(&[names::DYNAMIC_TABLE])
            .tag(tags::REGRESSION),
        );
    }
    suite
}

pub(super) fn tags_input() -> TestSuite {
    TestSuite::new("tags-input")
        .with_test(
            TestCase::new("replace placeholders with two tags", |ctx| async move {
                let tag_box = ctx.fixture::<TagsPage>(names::TAGS)?;
                tag_box.navigate().await?;
                tag_box.remove_all().await?;
                tag_box.verify_no_tags().await?;
                for person in &PEOPLE[..2] {
                    tag_box.add_tag(person).await?;
                    tag_box.verify_tag(person).await?;
                }
                Ok(())
            })
            .uses(&[names::TAGS])
            .tag(tags::SMOKE),
        )
        .with_test(
            TestCase::new("fill the box with ten tags", |ctx| async move {
                let tag_box = ctx.fixture::<TagsPage>(names::TAGS)?;
                tag_box.navigate().await?;
                tag_box.remove_all().await?;
                tag_box.verify_no_tags().await?;
                for person in PEOPLE {
                    tag_box.add_tag(person).await?;
                    tag_box.verify_tag(person).await?;
                }
                Ok(())
            })
            .uses(&[names::TAGS])
            .tag(tags::REGRESSION),
        )
}

pub(super) fn verify_account() -> TestSuite {
    TestSuite::new("verify-account")
        .with_test(
            TestCase::new("typed code is accepted", |ctx| async move {
                let page = ctx.fixture::<VerifyAccountPage>(names::VERIFY_ACCOUNT)?;
                page.navigate().await?;
                page.enter_code_by_typing('9').await?;
                page.verify_success().await
            })
            .uses(&[names::VERIFY_ACCOUNT])
            .tag(tags::SMOKE),
        )
        .with_test(
            TestCase::new("code entered with arrow keys is accepted", |ctx| async move {
                let page = ctx.fixture::<VerifyAccountPage>(names::VERIFY_ACCOUNT)?;
                page.navigate().await?;
                page.enter_code_with_arrows().await?;
                page.verify_success().await
            })
            .uses(&[names::VERIFY_ACCOUNT])
            .tag(tags::REGRESSION),
        )
}

pub(super) fn onboarding_modal() -> TestSuite {
    TestSuite::new("onboarding-modal").with_test(
        TestCase::new("menu shows the onboarding link", |ctx| async move {
            let page = ctx.fixture::<OnboardingModalPage>(names::ONBOARDING_MODAL)?;
            page.navigate().await?;
            page.verify_welcome_visible().await?;
            page.open_menu().await?;
            page.verify_menu_link_visible().await
        })
        .uses(&[names::ONBOARDING_MODAL])
        .tag(tags::SMOKE),
    )
}
