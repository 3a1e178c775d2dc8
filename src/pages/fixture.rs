//! In-memory copy of the payment block, wired to the page model's locators.

use crate::browser::PageSession;
use crate::core::{BrowserDriver, WaitConfig};
use crate::dom::{Locator, LocatorTable};
use crate::pages::pay_section::{
    locators, BrandMark, Field, PageLink, PaySectionPage, PaymentTab, BLOCK_TITLE, COOKIE_REJECT,
    CONTINUE_BUTTON, FRAME_AMOUNT, PAY_SECTION, PAYMENT_FRAME,
};
use crate::scenario::pay_section::{expected_placeholder, SERVICE_DETAILS_URL};
use crate::testing::{ClickEffect, FakeDriver, FakeNode, FakePage};
use crate::types::BrowserConfig;

pub const START_URL: &str = "https://www.mts.by/";
pub const HELP_URL: &str = SERVICE_DETAILS_URL;

pub fn fast_waits() -> WaitConfig {
    WaitConfig {
        page_timeout_ms: 300,
        overlay_timeout_ms: 40,
        navigation_timeout_ms: 300,
        poll_interval_ms: 5,
    }
}

fn locator(table: &LocatorTable, name: &str) -> Locator {
    table
        .get(name)
        .map(|element| element.locator.clone())
        .unwrap_or_else(|e| panic!("fixture references {}: {}", name, e))
}

fn node(table: &LocatorTable, name: &str) -> FakeNode {
    FakeNode::new(locator(table, name))
}

fn payment_frame(table: &LocatorTable) -> FakePage {
    let mut frame = FakePage::new().with_node(
        node(table, FRAME_AMOUNT)
            .with_text("Оплата: Услуги связи\nНомер:375297777777\n100.00 BYN")
            .hidden_for_checks(2),
    );
    for field in [Field::CardNumber, Field::CardExpiry, Field::CardCvv] {
        frame = frame.with_node(
            node(table, &field.element_name()).placeholder(expected_placeholder(field)),
        );
    }
    for brand in [BrandMark::Visa, BrandMark::MasterCard] {
        frame = frame.with_node(node(table, &brand.frame_element_name()));
    }
    frame
}

/// The start page: consent banner, the payment block with four tabs, and a
/// payment frame that appears once the connection form is submitted.
pub fn start_page() -> FakePage {
    let table = locators();
    let mut page = FakePage::new()
        .with_node(
            node(&table, COOKIE_REJECT)
                .on_click(ClickEffect::Remove(locator(&table, COOKIE_REJECT))),
        )
        .with_node(node(&table, PAY_SECTION))
        .with_node(node(&table, BLOCK_TITLE).with_text("Онлайн пополнение\nбез комиссии"))
        .with_node(
            node(&table, PageLink::AboutService.element_name())
                .on_click(ClickEffect::Navigate(HELP_URL.to_string())),
        );

    for brand in BrandMark::ALL {
        page = page.with_node(node(&table, &brand.section_element_name()));
    }

    for tab in PaymentTab::ALL {
        let mut button = node(&table, &tab.element_name()).with_text(tab.label());
        for other in PaymentTab::ALL {
            for field in other.fields() {
                let target = locator(&table, &field.element_name());
                button = button.on_click(if other == tab {
                    ClickEffect::Reveal(target)
                } else {
                    ClickEffect::Conceal(target)
                });
            }
        }
        page = page.with_node(button);

        for &field in tab.fields() {
            let input =
                node(&table, &field.element_name()).placeholder(expected_placeholder(field));
            page = page.with_node(if tab == PaymentTab::Connection {
                input
            } else {
                input.detached()
            });
        }
    }

    page.with_node(
        node(&table, CONTINUE_BUTTON)
            .on_click(ClickEffect::Reveal(locator(&table, PAYMENT_FRAME))),
    )
    .with_frame(node(&table, PAYMENT_FRAME).detached(), payment_frame(&table))
}

pub fn driver() -> FakeDriver {
    FakeDriver::new()
        .with_page(START_URL, start_page())
        .with_page(HELP_URL, FakePage::new())
}

/// Launched page model over `driver`; pass [`driver`] for the full site.
pub async fn page<D: BrowserDriver>(driver: D) -> PaySectionPage<D> {
    page_at(driver, START_URL).await
}

pub async fn page_at<D: BrowserDriver>(driver: D, start_url: &str) -> PaySectionPage<D> {
    let session = PageSession::launch(driver, &BrowserConfig::default(), fast_waits())
        .await
        .expect("fake browser launches");
    PaySectionPage::new(session, start_url)
}
