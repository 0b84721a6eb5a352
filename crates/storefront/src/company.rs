//! Company settings: contact details plus the tax, shipping, navigation and
//! home-page switches the storefront reads at runtime.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use eshop_core::{Language, LocalizedText, Price};

/// GST configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSettings {
    #[serde(rename = "enableGST")]
    pub enable_gst: bool,
    /// Percentage, e.g. `18` for 18%.
    pub gst_rate: Decimal,
}

impl TaxSettings {
    /// GST owed on `subtotal`, rounded to whole units.
    #[must_use]
    pub fn tax_on(&self, subtotal: Price) -> Price {
        if self.enable_gst {
            subtotal.percent(self.gst_rate)
        } else {
            Price::ZERO
        }
    }
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            enable_gst: true,
            gst_rate: Decimal::from(18),
        }
    }
}

/// Flat-rate shipping with a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSettings {
    pub enable_shipping: bool,
    /// Orders at or above this subtotal ship free.
    pub free_shipping_threshold: Price,
    pub shipping_charge: Price,
}

impl ShippingSettings {
    /// Shipping charged for `subtotal`.
    #[must_use]
    pub fn charge_for(&self, subtotal: Price) -> Price {
        if !self.enable_shipping || subtotal >= self.free_shipping_threshold {
            Price::ZERO
        } else {
            self.shipping_charge
        }
    }

    /// How much more the shopper must add to qualify for free shipping.
    ///
    /// `None` when shipping is disabled or the threshold is already met.
    #[must_use]
    pub fn shortfall(&self, subtotal: Price) -> Option<Price> {
        (self.enable_shipping && subtotal < self.free_shipping_threshold)
            .then(|| self.free_shipping_threshold - subtotal)
    }
}

impl Default for ShippingSettings {
    fn default() -> Self {
        Self {
            enable_shipping: true,
            free_shipping_threshold: Price::from_units(2999),
            shipping_charge: Price::from_units(99),
        }
    }
}

/// Top-level pages that can be switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Home,
    Products,
    About,
    Contact,
}

/// Which storefront pages are reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct NavigationSettings {
    pub enable_home: bool,
    pub enable_products: bool,
    pub enable_about: bool,
    pub enable_contact: bool,
    pub enable_cart: bool,
}

impl NavigationSettings {
    /// First enabled page in menu order, falling back to products.
    #[must_use]
    pub const fn landing_page(&self) -> Page {
        if self.enable_home {
            Page::Home
        } else if self.enable_products {
            Page::Products
        } else if self.enable_about {
            Page::About
        } else if self.enable_contact {
            Page::Contact
        } else {
            Page::Products
        }
    }
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            enable_home: true,
            enable_products: true,
            enable_about: true,
            enable_contact: true,
            enable_cart: true,
        }
    }
}

/// Login and signup switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    pub enable_login: bool,
    pub enable_signup: bool,
    pub show_demo_credentials: bool,
}

/// Order of the two home page sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionOrder {
    TrendingFirst,
    #[default]
    HeroSecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePageSettings {
    pub show_hero_section: bool,
    pub show_trending_section: bool,
    pub section_order: SectionOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub twitter: String,
}

/// The company record edited from the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanySettings {
    pub name: LocalizedText,
    pub logo: String,
    pub tagline: LocalizedText,
    pub description: LocalizedText,
    pub address: LocalizedText,
    pub phone: String,
    pub email: String,
    pub gst_number: String,
    pub website: String,
    /// Image name of the payment QR code.
    #[serde(rename = "paymentQR")]
    pub payment_qr: String,
    #[serde(rename = "whatsappQR")]
    pub whatsapp_qr: String,
    pub whatsapp_number: String,
    pub whatsapp_message: LocalizedText,
    pub social_media: SocialLinks,
    pub default_theme: String,
    pub default_language: Language,
    pub tax_settings: TaxSettings,
    pub shipping_settings: ShippingSettings,
    pub navigation_settings: NavigationSettings,
    pub auth_settings: AuthSettings,
    pub home_page_settings: HomePageSettings,
}

/// Problems with a company record submitted from the admin form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompanyValidationError {
    #[error("company name is required")]
    MissingName,
    #[error("GST rate must be between 0 and 100")]
    GstRateOutOfRange,
    #[error("shipping amounts cannot be negative")]
    NegativeShipping,
}

impl CompanySettings {
    /// Check the values checkout depends on.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), CompanyValidationError> {
        if self.name.is_blank() {
            return Err(CompanyValidationError::MissingName);
        }
        let rate = self.tax_settings.gst_rate;
        if rate.is_sign_negative() || rate > Decimal::ONE_HUNDRED {
            return Err(CompanyValidationError::GstRateOutOfRange);
        }
        let shipping = &self.shipping_settings;
        if shipping.shipping_charge < Price::ZERO || shipping.free_shipping_threshold < Price::ZERO
        {
            return Err(CompanyValidationError::NegativeShipping);
        }
        Ok(())
    }

    /// Name in the requested language.
    #[must_use]
    pub fn display_name(&self, language: Language) -> &str {
        self.name.get(language)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_threshold() {
        let shipping = ShippingSettings::default();
        assert_eq!(
            shipping.charge_for(Price::from_units(2500)),
            Price::from_units(99)
        );
        assert_eq!(shipping.charge_for(Price::from_units(2999)), Price::ZERO);
        assert_eq!(
            shipping.shortfall(Price::from_units(2500)),
            Some(Price::from_units(499))
        );
        assert_eq!(shipping.shortfall(Price::from_units(3000)), None);
    }

    #[test]
    fn test_shipping_disabled() {
        let shipping = ShippingSettings {
            enable_shipping: false,
            ..ShippingSettings::default()
        };
        assert_eq!(shipping.charge_for(Price::from_units(10)), Price::ZERO);
        assert_eq!(shipping.shortfall(Price::from_units(10)), None);
    }

    #[test]
    fn test_tax() {
        let tax = TaxSettings::default();
        assert_eq!(tax.tax_on(Price::from_units(2500)), Price::from_units(450));

        let off = TaxSettings {
            enable_gst: false,
            ..tax
        };
        assert_eq!(off.tax_on(Price::from_units(2500)), Price::ZERO);
    }

    #[test]
    fn test_landing_page() {
        let mut nav = NavigationSettings::default();
        assert_eq!(nav.landing_page(), Page::Home);
        nav.enable_home = false;
        nav.enable_products = false;
        assert_eq!(nav.landing_page(), Page::About);
        nav.enable_about = false;
        nav.enable_contact = false;
        assert_eq!(nav.landing_page(), Page::Products);
    }

    #[test]
    fn test_serde_wire_names() {
        let json = r#"{
            "name": {"en": "ABN"},
            "taxSettings": {"enableGST": true, "gstRate": 18},
            "shippingSettings": {"enableShipping": true, "freeShippingThreshold": 2999, "shippingCharge": 99},
            "homePageSettings": {"showHeroSection": false, "showTrendingSection": true, "sectionOrder": "trending-first"},
            "paymentQR": "payment-qr.png"
        }"#;
        let settings: CompanySettings = serde_json::from_str(json).unwrap();
        assert!(settings.tax_settings.enable_gst);
        assert_eq!(settings.payment_qr, "payment-qr.png");
        assert_eq!(
            settings.home_page_settings.section_order,
            SectionOrder::TrendingFirst
        );
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_gst_rate() {
        let mut settings = CompanySettings {
            name: LocalizedText::english("ABN"),
            ..CompanySettings::default()
        };
        settings.tax_settings.gst_rate = Decimal::from(120);
        assert_eq!(
            settings.validate(),
            Err(CompanyValidationError::GstRateOutOfRange)
        );
    }
}
