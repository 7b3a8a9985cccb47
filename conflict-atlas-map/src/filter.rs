use crate::MapResult;
use crate::style::Category;

/// The one category currently chosen in the filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterController {
    selected: Category,
}

impl FilterController {
    #[must_use]
    pub fn new(selected: Category) -> Self {
        Self { selected }
    }

    #[must_use]
    pub fn selected(&self) -> Category {
        self.selected
    }

    /// Returns `true` if this changed the selection.
    pub fn select(&mut self, category: Category) -> bool {
        let changed = self.selected != category;
        self.selected = category;
        changed
    }

    /// Select by id, as sent by a `<select>` element.
    pub fn select_id(&mut self, id: &str) -> MapResult<bool> {
        Ok(self.select(id.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapError;

    #[test]
    fn defaults_to_recent_conflicts() {
        assert_eq!(
            FilterController::default().selected(),
            Category::RecentConflicts
        );
    }

    #[test]
    fn select_reports_changes() {
        let mut filter = FilterController::default();
        assert!(filter.select(Category::Battles));
        assert!(!filter.select(Category::Battles));
        assert!(filter.select_id("high-fatality").unwrap());
        assert_eq!(filter.selected(), Category::HighFatality);

        assert!(matches!(
            filter.select_id("everything"),
            Err(MapError::UnknownCategory(..))
        ));
        assert_eq!(filter.selected(), Category::HighFatality);
    }
}
