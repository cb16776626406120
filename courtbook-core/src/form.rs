//! Writing a contact profile into the booking form.

use tracing::debug;

use crate::error::BookingError;
use crate::layout::FormFieldIds;
use crate::page::BookingPage;
use crate::profile::{ContactField, ContactProfile};
use crate::wizard::Step;

pub struct ContactFormFiller<'a> {
    fields: &'a FormFieldIds,
}

impl<'a> ContactFormFiller<'a> {
    pub fn new(fields: &'a FormFieldIds) -> Self {
        Self { fields }
    }

    /// Validate the whole profile, then write every field in form order.
    ///
    /// Returns the number of fields written. An incomplete profile fails
    /// before the first write.
    pub async fn fill<P: BookingPage + ?Sized>(&self, page: &P, profile: &ContactProfile) -> Result<usize, BookingError> {
        profile.validate()?;

        let mut written = 0;
        for field in ContactField::ALL {
            let id = self.fields.id_for(field);
            page.write_field(id, profile.get(field).trim())
                .await
                .map_err(|e| BookingError::from_page(Step::FillForm, e))?;
            debug!(field = field.as_str(), id, "wrote contact field");
            written += 1;
        }
        Ok(written)
    }
}
