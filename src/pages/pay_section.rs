//! Page model for the "online top-up without commission" payment block.

use crate::browser::{PageSession, WaitCondition};
use crate::core::BrowserDriver;
use crate::dom::{xpath_literal, ElementRef, Locator, LocatorTable};
use crate::errors::{CheckError, Result};
use crate::pages::PageModel;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

pub const PAY_SECTION: &str = "pay_section";
pub const BLOCK_TITLE: &str = "block_title";
pub const COOKIE_REJECT: &str = "cookie_reject";
pub const CONTINUE_BUTTON: &str = "continue_button";
pub const PAYMENT_FRAME: &str = "payment_frame";
pub const FRAME_AMOUNT: &str = "frame_amount";

const SECTION_XPATH: &str = "//*[@id='pay-section']";

/// The four tabs of the payment form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentTab {
    Connection,
    HomeInternet,
    Installment,
    Debt,
}

impl PaymentTab {
    pub const ALL: [PaymentTab; 4] = [
        PaymentTab::Connection,
        PaymentTab::HomeInternet,
        PaymentTab::Installment,
        PaymentTab::Debt,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PaymentTab::Connection => "Услуги связи",
            PaymentTab::HomeInternet => "Домашний интернет",
            PaymentTab::Installment => "Рассрочка",
            PaymentTab::Debt => "Задолженность",
        }
    }

    /// Fails fast on anything but the four known labels.
    pub fn from_label(label: &str) -> Result<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|tab| tab.label() == label)
            .ok_or_else(|| CheckError::UnknownTab(label.to_string()))
    }

    /// Inputs shown on this tab, account field first.
    pub fn fields(&self) -> &'static [Field] {
        match self {
            PaymentTab::Connection => &[
                Field::ConnectionPhone,
                Field::ConnectionSum,
                Field::ConnectionEmail,
            ],
            PaymentTab::HomeInternet => &[Field::InternetAccount, Field::InternetSum],
            PaymentTab::Installment => &[Field::InstallmentContract, Field::InstallmentSum],
            PaymentTab::Debt => &[Field::DebtAccount, Field::DebtSum],
        }
    }

    /// Field whose visibility proves the tab's form is on screen.
    pub fn ready_field(&self) -> Field {
        self.fields()[0]
    }

    pub fn element_name(&self) -> String {
        format!("tab_{}", self.slug())
    }

    fn slug(&self) -> &'static str {
        match self {
            PaymentTab::Connection => "connection",
            PaymentTab::HomeInternet => "home_internet",
            PaymentTab::Installment => "installment",
            PaymentTab::Debt => "debt",
        }
    }

    fn element(&self) -> ElementRef {
        ElementRef::new(
            self.element_name(),
            Locator::xpath(format!(
                "{}//button[contains(normalize-space(.), {})]",
                SECTION_XPATH,
                xpath_literal(self.label())
            )),
        )
    }
}

impl FromStr for PaymentTab {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_label(s)
    }
}

impl fmt::Display for PaymentTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Text inputs on the page and inside the payment frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ConnectionPhone,
    ConnectionSum,
    ConnectionEmail,
    InternetAccount,
    InternetSum,
    InstallmentContract,
    InstallmentSum,
    DebtAccount,
    DebtSum,
    CardNumber,
    CardExpiry,
    CardCvv,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::ConnectionPhone,
        Field::ConnectionSum,
        Field::ConnectionEmail,
        Field::InternetAccount,
        Field::InternetSum,
        Field::InstallmentContract,
        Field::InstallmentSum,
        Field::DebtAccount,
        Field::DebtSum,
        Field::CardNumber,
        Field::CardExpiry,
        Field::CardCvv,
    ];

    pub fn dom_id(&self) -> &'static str {
        match self {
            Field::ConnectionPhone => "connection-phone",
            Field::ConnectionSum => "connection-sum",
            Field::ConnectionEmail => "connection-email",
            Field::InternetAccount => "internet-account",
            Field::InternetSum => "internet-sum",
            Field::InstallmentContract => "installment-contract",
            Field::InstallmentSum => "installment-sum",
            Field::DebtAccount => "debt-account",
            Field::DebtSum => "debt-sum",
            Field::CardNumber => "pan",
            Field::CardExpiry => "expiration",
            Field::CardCvv => "cvc",
        }
    }

    pub fn in_payment_frame(&self) -> bool {
        matches!(self, Field::CardNumber | Field::CardExpiry | Field::CardCvv)
    }

    pub fn element_name(&self) -> String {
        format!("field_{}", self.dom_id().replace('-', "_"))
    }

    fn element(&self) -> ElementRef {
        let element = ElementRef::new(self.element_name(), Locator::id(self.dom_id()));
        if self.in_payment_frame() {
            element.in_frame(PAYMENT_FRAME)
        } else {
            element
        }
    }
}

/// Payment-system logos, identified by their accessible name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrandMark {
    Visa,
    VerifiedByVisa,
    MasterCard,
    MasterCardSecureCode,
    Belkart,
}

impl BrandMark {
    pub const ALL: [BrandMark; 5] = [
        BrandMark::Visa,
        BrandMark::VerifiedByVisa,
        BrandMark::MasterCard,
        BrandMark::MasterCardSecureCode,
        BrandMark::Belkart,
    ];

    pub fn alt_text(&self) -> &'static str {
        match self {
            BrandMark::Visa => "Visa",
            BrandMark::VerifiedByVisa => "Verified By Visa",
            BrandMark::MasterCard => "MasterCard",
            BrandMark::MasterCardSecureCode => "MasterCard Secure Code",
            BrandMark::Belkart => "Белкарт",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            BrandMark::Visa => "visa",
            BrandMark::VerifiedByVisa => "verified_by_visa",
            BrandMark::MasterCard => "mastercard",
            BrandMark::MasterCardSecureCode => "mastercard_secure_code",
            BrandMark::Belkart => "belkart",
        }
    }

    pub fn section_element_name(&self) -> String {
        format!("logo_{}", self.slug())
    }

    pub fn frame_element_name(&self) -> String {
        format!("frame_logo_{}", self.slug())
    }

    fn section_element(&self) -> ElementRef {
        ElementRef::new(
            self.section_element_name(),
            Locator::xpath(format!(
                "{}//img[@alt={}]",
                SECTION_XPATH,
                xpath_literal(self.alt_text())
            )),
        )
    }

    fn frame_element(&self) -> ElementRef {
        ElementRef::new(
            self.frame_element_name(),
            Locator::css(format!("img[alt=\"{}\"]", self.alt_text())),
        )
        .in_frame(PAYMENT_FRAME)
    }
}

impl fmt::Display for BrandMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alt_text())
    }
}

/// Links inside the payment block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageLink {
    AboutService,
}

impl PageLink {
    pub fn href(&self) -> &'static str {
        match self {
            PageLink::AboutService => "/help/poryadok-oplaty-i-bezopasnost-internet-platezhey/",
        }
    }

    pub fn element_name(&self) -> &'static str {
        match self {
            PageLink::AboutService => "about_service_link",
        }
    }


    fn element(&self) -> ElementRef {
        ElementRef::new(
            self.element_name(),
            Locator::xpath(format!(
                "{}//a[@href={}]",
                SECTION_XPATH,
                xpath_literal(self.href())
            )),
        )
    }
}

/// Every element the page model touches, by semantic name.
pub fn locators() -> LocatorTable {
    let mut table = LocatorTable::new()
        .with(ElementRef::new(PAY_SECTION, Locator::id("pay-section")))
        .with(ElementRef::new(
            BLOCK_TITLE,
            Locator::xpath(format!("{}//h2", SECTION_XPATH)),
        ))
        .with(ElementRef::new(
            COOKIE_REJECT,
            Locator::css("button.cookie__cancel[data-close]"),
        ))
        .with(ElementRef::new(
            CONTINUE_BUTTON,
            Locator::xpath(format!(
                "{}//form[1]//button[contains(text(), 'Продолжить')]",
                SECTION_XPATH
            )),
        ))
        .with(ElementRef::new(
            PAYMENT_FRAME,
            Locator::css("iframe.bepaid-iframe"),
        ))
        .with(
            ElementRef::new(
                FRAME_AMOUNT,
                Locator::xpath("//span[contains(text(), 'BYN')]"),
            )
            .in_frame(PAYMENT_FRAME),
        )
        .with(PageLink::AboutService.element());

    for tab in PaymentTab::ALL {
        table.insert(tab.element());
    }
    for field in Field::ALL {
        table.insert(field.element());
    }
    for brand in BrandMark::ALL {
        table.insert(brand.section_element());
        table.insert(brand.frame_element());
    }
    table
}

pub struct PaySectionPage<D: BrowserDriver> {
    session: PageSession<D>,
    table: LocatorTable,
    start_url: String,
}

impl<D: BrowserDriver> PaySectionPage<D> {
    pub fn new(session: PageSession<D>, start_url: impl Into<String>) -> Self {
        Self {
            session,
            table: locators(),
            start_url: start_url.into(),
        }
    }

    pub fn with_overrides(mut self, overrides: &HashMap<String, Locator>) -> Result<Self> {
        self.table.apply_overrides(overrides)?;
        Ok(self)
    }

    pub fn session(&self) -> &PageSession<D> {
        &self.session
    }

    pub fn locators(&self) -> &LocatorTable {
        &self.table
    }

    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    pub async fn open(&mut self) -> Result<()> {
        self.session.navigate(&self.start_url).await
    }

    /// Click "reject" on the cookie banner if it shows up in time.
    ///
    /// Returns whether the banner was there; its absence is not an error, so
    /// calling this again after it is gone is harmless.
    pub async fn dismiss_consent_overlay_if_present(&self) -> Result<bool> {
        let dismissed = self
            .session
            .dispatch_click_if_present(self.table.get(COOKIE_REJECT)?)
            .await?;
        if dismissed {
            info!("consent overlay dismissed");
        }
        Ok(dismissed)
    }

    async fn scroll_to_pay_section(&self) -> Result<()> {
        self.session
            .scroll_into_view(self.table.get(PAY_SECTION)?)
            .await
    }

    pub async fn read_block_title(&self) -> Result<String> {
        self.scroll_to_pay_section().await?;
        self.session.read_text(self.table.get(BLOCK_TITLE)?).await
    }

    /// Click `link`; waiting for the resulting navigation is up to the caller.
    pub async fn activate_link(&self, link: PageLink) -> Result<()> {
        self.scroll_to_pay_section().await?;
        self.session.click(self.table.get(link.element_name())?).await
    }

    pub async fn is_logo_visible(&self, brand: BrandMark) -> Result<bool> {
        self.scroll_to_pay_section().await?;
        self.session
            .is_displayed(self.table.get(&brand.section_element_name())?)
            .await
    }

    pub async fn open_tab(&self, tab: PaymentTab) -> Result<()> {
        self.scroll_to_pay_section().await?;
        self.session
            .click(self.table.get(&tab.element_name())?)
            .await?;
        self.session
            .wait_for(
                self.table.get(&tab.ready_field().element_name())?,
                WaitCondition::Visible,
            )
            .await?;
        debug!(%tab, "tab opened");
        Ok(())
    }

    pub async fn read_placeholder(&self, field: Field) -> Result<String> {
        self.session
            .read_attribute(self.table.get(&field.element_name())?, "placeholder")
            .await
    }

    /// Append `text` to the field; no formatting or validation happens here.
    pub async fn enter_text(&self, field: Field, text: &str) -> Result<()> {
        self.session
            .type_text(self.table.get(&field.element_name())?, text)
            .await
    }

    pub async fn submit_connection_form(&self) -> Result<()> {
        self.session.click(self.table.get(CONTINUE_BUTTON)?).await
    }

    /// All queries go to the payment frame until [`Self::exit_frame_context`].
    pub async fn enter_payment_frame(&mut self) -> Result<()> {
        self.scroll_to_pay_section().await?;
        self.session
            .enter_frame(self.table.get(PAYMENT_FRAME)?)
            .await
    }

    pub fn exit_frame_context(&mut self) {
        self.session.exit_frame();
    }

    pub async fn read_frame_amount_text(&self) -> Result<String> {
        self.session.read_text(self.table.get(FRAME_AMOUNT)?).await
    }

    pub async fn is_frame_logo_visible(&self, brand: BrandMark) -> Result<bool> {
        self.session
            .is_displayed(self.table.get(&brand.frame_element_name())?)
            .await
    }

    pub async fn current_url(&self) -> Result<String> {
        self.session.current_url().await
    }

    pub async fn wait_for_url(&self, expected: &str) -> Result<String> {
        self.session.wait_for_url(expected).await
    }
}

#[async_trait]
impl<D: BrowserDriver> PageModel for PaySectionPage<D> {
    async fn reset(&mut self) -> Result<()> {
        self.exit_frame_context();
        self.open().await?;
        self.dismiss_consent_overlay_if_present().await?;
        Ok(())
    }

    async fn teardown(&mut self) -> Result<()> {
        self.session.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Scope;
    use crate::pages::fixture;
    use tokio_test::assert_ok;

    #[test]
    fn tab_labels_round_trip_and_unknown_fails_fast() {
        for tab in PaymentTab::ALL {
            assert_eq!(tab.label().parse::<PaymentTab>().unwrap(), tab);
        }
        assert_eq!(
            PaymentTab::from_label(" Рассрочка ").unwrap(),
            PaymentTab::Installment
        );
        match "Кредит".parse::<PaymentTab>() {
            Err(CheckError::UnknownTab(label)) => assert_eq!(label, "Кредит"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn table_declares_every_element_with_the_right_scope() {
        let table = locators();
        for field in Field::ALL {
            let element = table.get(&field.element_name()).unwrap();
            assert_eq!(
                element.scope == Scope::Frame(PAYMENT_FRAME.to_string()),
                field.in_payment_frame()
            );
        }
        for brand in BrandMark::ALL {
            assert_eq!(
                table.get(&brand.section_element_name()).unwrap().scope,
                Scope::Document
            );
            assert!(table.contains(&brand.frame_element_name()));
        }
        assert_eq!(
            table.get(&PaymentTab::Debt.element_name()).unwrap().locator,
            Locator::xpath(
                "//*[@id='pay-section']//button[contains(normalize-space(.), 'Задолженность')]"
            )
        );
    }

    #[tokio::test]
    async fn block_title_is_normalized() {
        let mut page = fixture::page(fixture::driver()).await;
        page.reset().await.unwrap();
        assert_eq!(
            page.read_block_title().await.unwrap(),
            "Онлайн пополнение без комиссии"
        );
        let scrolls = page
            .session()
            .driver()
            .scrolls(&Locator::id("pay-section"))
            .await;
        assert_eq!(scrolls, 1);
    }

    #[tokio::test]
    async fn overlay_dismissal_is_idempotent() {
        let mut page = fixture::page(fixture::driver()).await;
        page.open().await.unwrap();
        assert!(page.dismiss_consent_overlay_if_present().await.unwrap());
        assert!(!page.dismiss_consent_overlay_if_present().await.unwrap());
        assert!(!page.dismiss_consent_overlay_if_present().await.unwrap());
    }

    #[tokio::test]
    async fn open_tab_waits_for_its_form() {
        let mut page = fixture::page(fixture::driver()).await;
        page.reset().await.unwrap();
        assert_ok!(page.open_tab(PaymentTab::Installment).await);
        assert_eq!(
            page.read_placeholder(Field::InstallmentContract).await.unwrap(),
            "Номер счета на 44"
        );
    }

    #[tokio::test]
    async fn frame_fields_need_the_frame_context() {
        let mut page = fixture::page(fixture::driver()).await;
        page.reset().await.unwrap();
        assert!(matches!(
            page.read_placeholder(Field::CardNumber).await,
            Err(CheckError::ContextMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn typed_text_is_appended() {
        let mut page = fixture::page(fixture::driver()).await;
        page.reset().await.unwrap();
        page.enter_text(Field::ConnectionPhone, "29").await.unwrap();
        page.enter_text(Field::ConnectionPhone, "7777777").await.unwrap();
        let value = page
            .session()
            .driver()
            .value(&Locator::id("connection-phone"))
            .await;
        assert_eq!(value.as_deref(), Some("297777777"));
    }

    #[tokio::test]
    async fn overrides_redirect_lookups() {
        let mut overrides = HashMap::new();
        overrides.insert(BLOCK_TITLE.to_string(), Locator::css("h1.missing"));
        let mut page = fixture::page(fixture::driver())
            .await
            .with_overrides(&overrides)
            .unwrap();
        page.reset().await.unwrap();
        let err = page.read_block_title().await.unwrap_err();
        assert!(err.is_timeout());
    }
}
