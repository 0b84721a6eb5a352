//! Company settings panel.

use eshop_storefront::Storefront;
use eshop_storefront::company::CompanySettings;
use eshop_storefront::demo::DemoData;
use eshop_storefront::services::auth::AdminAccess;

use crate::error::Result;

pub struct CompanyAdmin<'a> {
    store: &'a mut Storefront,
    access: &'a AdminAccess,
}

impl<'a> CompanyAdmin<'a> {
    #[must_use]
    pub const fn new(store: &'a mut Storefront, access: &'a AdminAccess) -> Self {
        Self { store, access }
    }

    #[must_use]
    pub fn settings(&self) -> &CompanySettings {
        self.store.company()
    }

    /// Validate and save the submitted form.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Company`; the stored settings are kept on error.
    pub fn update(&mut self, settings: CompanySettings) -> Result<()> {
        self.store.update_company(self.access, settings)?;
        Ok(())
    }

    /// Restore the bundled demo company record.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Demo` if the bundled data cannot be read.
    pub fn reset_to_defaults(&mut self) -> Result<()> {
        let defaults = DemoData::load()?.company;
        self.store.update_company(self.access, defaults)?;
        tracing::info!(actor = self.access.actor().name(), "Company settings reset");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eshop_core::Price;
    use eshop_storefront::company::CompanyValidationError;
    use eshop_storefront::config::StorefrontConfig;
    use eshop_storefront::services::auth::AuthGate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::error::AdminError;

    #[test]
    fn test_update_and_reset() {
        let mut store = Storefront::in_memory(StorefrontConfig::default());
        let access = AuthGate::operator();
        let mut admin = CompanyAdmin::new(&mut store, &access);
        admin.reset_to_defaults().unwrap();
        assert_eq!(admin.settings().name.en, "ABN Heating System");

        let mut settings = admin.settings().clone();
        settings.shipping_settings.free_shipping_threshold = Price::from_units(1999);
        admin.update(settings).unwrap();
        assert_eq!(
            store.company().shipping_settings.free_shipping_threshold,
            Price::from_units(1999)
        );
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut store = Storefront::in_memory(StorefrontConfig::default());
        let access = AuthGate::operator();
        let mut admin = CompanyAdmin::new(&mut store, &access);
        admin.reset_to_defaults().unwrap();

        let mut settings = admin.settings().clone();
        settings.tax_settings.gst_rate = Decimal::from(120);
        assert!(matches!(
            admin.update(settings),
            Err(AdminError::Company(CompanyValidationError::GstRateOutOfRange))
        ));
        assert_eq!(admin.settings().tax_settings.gst_rate, Decimal::from(18));
    }
}
