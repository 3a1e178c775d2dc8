//! Checks for the bill-payment block of the operator's start page.

use crate::core::BrowserDriver;
use crate::errors::Result;
use crate::pages::{BrandMark, Field, PageLink, PaySectionPage, PaymentTab};
use crate::scenario::{expect_contains, expect_eq, expect_true, Scenario, SuiteRunner};
use async_trait::async_trait;

pub const BLOCK_TITLE_TEXT: &str = "Онлайн пополнение без комиссии";
pub const PHONE_NUMBER: &str = "297777777";
pub const PAYMENT_SUM: &str = "100.00";
pub const RECEIPT_EMAIL: &str = "test@mail.com";
pub const FRAME_AMOUNT_TEXT: &str = "100.00 BYN";
/// Fixed target of the "about the service" link, whatever start URL is configured.
pub const SERVICE_DETAILS_URL: &str =
    "https://www.mts.by/help/poryadok-oplaty-i-bezopasnost-internet-platezhey/";

/// Placeholder each field must show once its tab is open.
pub fn expected_placeholder(field: Field) -> &'static str {
    match field {
        Field::ConnectionPhone => "Номер телефона",
        Field::ConnectionEmail => "E-mail для отправки чека",
        Field::InternetAccount => "Номер абонента",
        Field::InstallmentContract => "Номер счета на 44",
        Field::DebtAccount => "Номер счета на 2073",
        Field::ConnectionSum | Field::InternetSum | Field::InstallmentSum | Field::DebtSum => {
            "Сумма"
        }
        Field::CardNumber => "Номер карты",
        Field::CardExpiry => "MM/ГГ",
        Field::CardCvv => "CVV",
    }
}

pub struct BlockTitle;

#[async_trait]
impl<D: BrowserDriver> Scenario<PaySectionPage<D>> for BlockTitle {
    fn name(&self) -> &str {
        "block_title"
    }

    fn description(&self) -> &str {
        "payment block heading reads as expected"
    }

    async fn run(&self, page: &mut PaySectionPage<D>) -> Result<()> {
        let title = page.read_block_title().await?;
        expect_eq("block title", BLOCK_TITLE_TEXT, title.as_str())
    }
}

pub struct LogoVisible {
    brand: BrandMark,
    name: String,
    description: String,
}

impl LogoVisible {
    pub fn new(brand: BrandMark) -> Self {
        Self {
            brand,
            name: brand.section_element_name(),
            description: format!("{} logo is shown in the payment block", brand),
        }
    }
}

#[async_trait]
impl<D: BrowserDriver> Scenario<PaySectionPage<D>> for LogoVisible {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, page: &mut PaySectionPage<D>) -> Result<()> {
        let visible = page.is_logo_visible(self.brand).await?;
        expect_true(&format!("{} logo visible", self.brand), visible)
    }
}

pub struct ServiceDetailsLink;

#[async_trait]
impl<D: BrowserDriver> Scenario<PaySectionPage<D>> for ServiceDetailsLink {
    fn name(&self) -> &str {
        "service_details_link"
    }

    fn description(&self) -> &str {
        "\"about the service\" link opens the payment help page"
    }

    async fn run(&self, page: &mut PaySectionPage<D>) -> Result<()> {
        page.activate_link(PageLink::AboutService).await?;
        let actual = page.wait_for_url(SERVICE_DETAILS_URL).await?;
        expect_eq("details page URL", SERVICE_DETAILS_URL, actual.as_str())
    }
}

pub struct TabPlaceholders {
    tab: PaymentTab,
    name: String,
    description: String,
}

impl TabPlaceholders {
    pub fn new(tab: PaymentTab) -> Self {
        Self {
            tab,
            name: format!("placeholders_{}", tab.element_name().trim_start_matches("tab_")),
            description: format!("\"{}\" tab shows the expected field hints", tab),
        }
    }
}

#[async_trait]
impl<D: BrowserDriver> Scenario<PaySectionPage<D>> for TabPlaceholders {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, page: &mut PaySectionPage<D>) -> Result<()> {
        page.open_tab(self.tab).await?;
        for &field in self.tab.fields() {
            let placeholder = page.read_placeholder(field).await?;
            expect_eq(
                &format!("{} placeholder of {}", self.tab, field.element_name()),
                expected_placeholder(field),
                placeholder.as_str(),
            )?;
        }
        Ok(())
    }
}

/// Fill the connection form, submit it and check the card-payment frame.
pub struct PaymentFrame;

impl PaymentFrame {
    async fn check_frame<D: BrowserDriver>(page: &PaySectionPage<D>) -> Result<()> {
        let amount = page.read_frame_amount_text().await?;
        expect_contains("payment frame amount", FRAME_AMOUNT_TEXT, &amount)?;

        for field in [Field::CardNumber, Field::CardExpiry, Field::CardCvv] {
            let placeholder = page.read_placeholder(field).await?;
            expect_eq(
                &format!("payment frame placeholder of {}", field.element_name()),
                expected_placeholder(field),
                placeholder.as_str(),
            )?;
        }

        for brand in [BrandMark::Visa, BrandMark::MasterCard] {
            let visible = page.is_frame_logo_visible(brand).await?;
            expect_true(&format!("{} logo visible in payment frame", brand), visible)?;
        }
        Ok(())
    }
}

#[async_trait]
impl<D: BrowserDriver> Scenario<PaySectionPage<D>> for PaymentFrame {
    fn name(&self) -> &str {
        "payment_frame"
    }

    fn description(&self) -> &str {
        "submitted connection payment opens the card frame with the right amount"
    }

    async fn run(&self, page: &mut PaySectionPage<D>) -> Result<()> {
        page.open_tab(PaymentTab::Connection).await?;
        page.enter_text(Field::ConnectionPhone, PHONE_NUMBER).await?;
        page.enter_text(Field::ConnectionSum, PAYMENT_SUM).await?;
        page.enter_text(Field::ConnectionEmail, RECEIPT_EMAIL).await?;
        page.submit_connection_form().await?;

        page.enter_payment_frame().await?;
        let outcome = Self::check_frame(page).await;
        page.exit_frame_context();
        outcome
    }
}

/// Every pay-section scenario in execution order.
pub fn pay_section_suite<D: BrowserDriver>() -> SuiteRunner<PaySectionPage<D>> {
    let mut runner = SuiteRunner::new().with(BlockTitle);
    for brand in BrandMark::ALL {
        runner.register(LogoVisible::new(brand));
    }
    runner.register(ServiceDetailsLink);
    for tab in PaymentTab::ALL {
        runner.register(TabPlaceholders::new(tab));
    }
    runner.with(PaymentFrame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Locator;
    use crate::errors::CheckError;
    use crate::pages::fixture;
    use crate::pages::PageModel;
    use crate::testing::{FakeNode, FakePage};

    #[tokio::test]
    async fn whole_suite_passes_against_the_scripted_site() {
        let mut page = fixture::page(fixture::driver()).await;
        let report = pay_section_suite().run(&mut page).await;

        for result in &report.results {
            assert!(result.passed, "{}: {:?}", result.name, result.failure);
        }
        assert_eq!(report.results.len(), 1 + 5 + 1 + 4 + 1);
        assert!(!page.session().driver().is_running());
    }

    #[test]
    fn scenario_names_are_unique() {
        let suite = pay_section_suite::<crate::testing::FakeDriver>();
        let mut names: Vec<String> = suite.list().into_iter().map(|(name, _)| name).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(names.contains(&"placeholders_home_internet".to_string()));
        assert!(names.contains(&"logo_belkart".to_string()));
    }

    #[tokio::test]
    async fn payment_frame_scenario_types_the_literal_values() {
        let mut page = fixture::page(fixture::driver()).await;
        page.reset().await.unwrap();
        PaymentFrame.run(&mut page).await.unwrap();

        assert!(page.session().context().is_top_level());
        let driver = page.session().driver();
        assert_eq!(
            driver.value(&Locator::id("connection-phone")).await.as_deref(),
            Some(PHONE_NUMBER)
        );
        assert_eq!(
            driver.value(&Locator::id("connection-sum")).await.as_deref(),
            Some(PAYMENT_SUM)
        );
        assert_eq!(
            driver.value(&Locator::id("connection-email")).await.as_deref(),
            Some(RECEIPT_EMAIL)
        );
    }

    #[tokio::test]
    async fn hidden_logo_fails_with_an_assertion() {
        let table = crate::pages::pay_section::locators();
        let visa = table
            .get(&BrandMark::Visa.section_element_name())
            .unwrap()
            .locator
            .clone();
        let section = table
            .get(crate::pages::pay_section::PAY_SECTION)
            .unwrap()
            .locator
            .clone();
        let driver = fixture::driver().with_page(
            "https://logos.test/",
            FakePage::new()
                .with_node(FakeNode::new(section))
                .with_node(FakeNode::new(visa).hidden()),
        );
        let mut page = fixture::page_at(driver, "https://logos.test/").await;
        page.open().await.unwrap();

        let err = LogoVisible::new(BrandMark::Visa)
            .run(&mut page)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::AssertionMismatch { .. }));

        // a logo that is not in the DOM at all is a wait failure, not a mismatch
        let err = LogoVisible::new(BrandMark::Belkart)
            .run(&mut page)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn details_link_target_does_not_follow_the_start_url() {
        let table = crate::pages::pay_section::locators();
        let link = table
            .get(PageLink::AboutService.element_name())
            .unwrap()
            .locator
            .clone();
        let section = table
            .get(crate::pages::pay_section::PAY_SECTION)
            .unwrap()
            .locator
            .clone();
        let staging_help = "https://staging.test/help/poryadok-oplaty-i-bezopasnost-internet-platezhey/";
        let driver = fixture::driver()
            .with_page(
                "https://staging.test/",
                FakePage::new().with_node(FakeNode::new(section)).with_node(
                    FakeNode::new(link)
                        .on_click(crate::testing::ClickEffect::Navigate(staging_help.to_string())),
                ),
            )
            .with_page(staging_help, FakePage::new());
        let mut page = fixture::page_at(driver, "https://staging.test/").await;
        page.open().await.unwrap();

        match ServiceDetailsLink.run(&mut page).await {
            Err(CheckError::NavigationFailed(msg)) => {
                assert!(msg.contains(SERVICE_DETAILS_URL));
                assert!(msg.contains(staging_help));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn frame_context_is_left_even_when_a_frame_check_fails() {
        let mut page = fixture::page(fixture::driver()).await;
        let mut overrides = std::collections::HashMap::new();
        overrides.insert(
            crate::pages::pay_section::FRAME_AMOUNT.to_string(),
            Locator::css("span.missing"),
        );
        page = page.with_overrides(&overrides).unwrap();
        page.reset().await.unwrap();

        assert!(PaymentFrame.run(&mut page).await.is_err());
        assert!(page.session().context().is_top_level());
        assert_eq!(page.read_block_title().await.unwrap(), BLOCK_TITLE_TEXT);
    }
}
