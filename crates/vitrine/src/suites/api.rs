//! Cat Fact and Wizard World checks; no page interaction.

use super::tags;
use crate::api::{ApiClient, CatFact, CatFactPage, House, NamedEntry};
use crate::harness::{KnownBug, TestCase, TestSuite};
use crate::sites::names;
use std::collections::HashSet;
use std::time::Duration;

/// Slowest acceptable response
pub const MAX_RESPONSE_TIME: Duration = Duration::from_millis(2000);

/// Well-formed UUID no resource carries
pub const NON_EXISTENT_UUID: &str = "00000000-0000-0000-0000-000000000000";

const HOUSES: [&str; 4] = ["Gryffindor", "Hufflepuff", "Ravenclaw", "Slytherin"];

/// Cat Fact suite
#[must_use]
pub fn cat_fact() -> TestSuite {
    TestSuite::new("cat-fact-api")
        .with_test(
            TestCase::new("single fact has a valid shape", |ctx| async move {
                let api = ctx.fixture::<ApiClient>(names::CAT_FACT_API)?;
                let response = api.get("/fact").await?;
                let soft = ctx.soft();
                soft.equals(&response.status, &200, "status")?;
                let fact: CatFact = response.json()?;
                soft.is_true(!fact.fact.is_empty(), "fact is not empty")?;
                soft.is_true(fact.length > 0, "length is positive")
            })
            .uses(&[names::CAT_FACT_API])
            .tag(tags::API)
            .tag(tags::SMOKE),
        )
        .with_test(
            TestCase::new("length matches the fact text", |ctx| async move {
                let api = ctx.fixture::<ApiClient>(names::CAT_FACT_API)?;
                let fact: CatFact = api.get("/fact").await?.json()?;
                ctx.expect()
                    .equals(&fact.length, &fact.fact.chars().count(), "reported length")
            })
            .uses(&[names::CAT_FACT_API])
            .tag(tags::API),
        )
        .with_test(
            TestCase::new("responds quickly with JSON", |ctx| async move {
                let api = ctx.fixture::<ApiClient>(names::CAT_FACT_API)?;
                let response = api.get("/fact").await?;
                let soft = ctx.soft();
                soft.is_true(
                    response.elapsed < MAX_RESPONSE_TIME,
                    &format!("answered within {MAX_RESPONSE_TIME:?} (took {:?})", response.elapsed),
                )?;
                soft.equals(&response.status, &200, "status")?;
                soft.contains(response.content_type(), "application/json", "content type")
            })
            .uses(&[names::CAT_FACT_API])
            .tag(tags::API),
        )
        .with_test(
            TestCase::new("max_length caps the fact", |ctx| async move {
                let api = ctx.fixture::<ApiClient>(names::CAT_FACT_API)?;
                let fact: CatFact = api
                    .get_with_query("/fact", &[("max_length", "50")])
                    .await?
                    .json()?;
                ctx.expect()
                    .is_true(fact.length <= 50, &format!("length {} <= 50", fact.length))
            })
            .uses(&[names::CAT_FACT_API])
            .tag(tags::API),
        )
        .with_test(
            TestCase::new("facts are paginated", |ctx| async move {
                let api = ctx.fixture::<ApiClient>(names::CAT_FACT_API)?;
                let response = api.get_with_query("/facts", &[("limit", "5")]).await?;
                let page: CatFactPage = response.json()?;
                let soft = ctx.soft();
                soft.equals(&response.status, &200, "status")?;
                soft.equals(&page.data.len(), &5, "facts on the page")?;
                soft.equals(&page.per_page, &5, "per_page")?;
                soft.equals(&page.current_page, &1, "current_page")?;
                soft.is_true(page.prev_page_url.is_none(), "first page has no previous page")?;
                soft.is_true(page.next_page_url.is_some(), "first page links the next one")
            })
            .uses(&[names::CAT_FACT_API])
            .tag(tags::API),
        )
}

/// Wizard World suite
#[must_use]
pub fn wizard_world() -> TestSuite {
    TestSuite::new("wizard-world-api")
        .with_test(
            TestCase::new("four houses", |ctx| async move {
                let api = ctx.fixture::<ApiClient>(names::WIZARD_WORLD_API)?;
                let response = api.get("/Houses").await?;
                let houses: Vec<House> = response.json()?;
                let soft = ctx.soft();
                soft.equals(&response.status, &200, "status")?;
                soft.equals(&houses.len(), &HOUSES.len(), "house count")?;
                let found: HashSet<&str> = houses.iter().map(|h| h.name.as_str()).collect();
                for house in HOUSES {
                    soft.is_true(found.contains(house), &format!("{house} is listed"))?;
                }
                Ok(())
            })
            .uses(&[names::WIZARD_WORLD_API])
            .tag(tags::API)
            .tag(tags::SMOKE),
        )
        .with_test(
            TestCase::new("house by id round-trips", |ctx| async move {
                let api = ctx.fixture::<ApiClient>(names::WIZARD_WORLD_API)?;
                let houses: Vec<House> = api.get("/Houses").await?.json()?;
                let Some(first) = houses.first() else {
                    return ctx.expect().is_true(false, "at least one house");
                };
                let house: House = api.get(&format!("/Houses/{}", first.id)).await?.json()?;
                ctx.expect().equals(&house.id, &first.id, "house id")
            })
            .uses(&[names::WIZARD_WORLD_API])
            .tag(tags::API),
        )
        .with_test(
            TestCase::new("elixir ids are unique", |ctx| async move {
                let api = ctx.fixture::<ApiClient>(names::WIZARD_WORLD_API)?;
                let elixirs: Vec<NamedEntry> = api.get("/Elixirs").await?.json()?;
                let unique: HashSet<&str> = elixirs.iter().map(|e| e.id.as_str()).collect();
                ctx.expect().equals(&unique.len(), &elixirs.len(), "distinct elixir ids")
            })
            .uses(&[names::WIZARD_WORLD_API])
            .tag(tags::API),
        )
        .with_test(
            TestCase::new("unknown elixir name gives an empty list", |ctx| async move {
                let api = ctx.fixture::<ApiClient>(names::WIZARD_WORLD_API)?;
                let response = api
                    .get_with_query("/Elixirs", &[("Name", "NonExistentElixir12345")])
                    .await?;
                let elixirs: Vec<NamedEntry> = response.json()?;
                let soft = ctx.soft();
                soft.equals(&response.status, &200, "status")?;
                soft.equals(&elixirs.len(), &0, "matches")
            })
            .uses(&[names::WIZARD_WORLD_API])
            .tag(tags::API)
            .tag(tags::NEGATIVE),
        )
        .with_test(
            TestCase::new("unknown elixir id is 404", |ctx| async move {
                let api = ctx.fixture::<ApiClient>(names::WIZARD_WORLD_API)?;
                let response = api.get(&format!("/Elixirs/{NON_EXISTENT_UUID}")).await?;
                ctx.expect().equals(&response.status, &404, "status")
            })
            .uses(&[names::WIZARD_WORLD_API])
            .tag(tags::API)
            .tag(tags::NEGATIVE)
            .known_bug(KnownBug::new("a missing elixir answers 500 instead of 404")),
        )
        .with_test(
            TestCase::new("unknown spell id is 404", |ctx| async move {
                let api = ctx.fixture::<ApiClient>(names::WIZARD_WORLD_API)?;
                let response = api.get(&format!("/Spells/{NON_EXISTENT_UUID}")).await?;
                ctx.expect().equals(&response.status, &404, "status")
            })
            .uses(&[names::WIZARD_WORLD_API])
            .tag(tags::API)
            .tag(tags::NEGATIVE)
            .known_bug(KnownBug::new("a missing spell answers 500 instead of 404")),
        )
}
