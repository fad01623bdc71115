// database/repository.rs - generic data access over a single collection

use futures::TryStreamExt;
use mongodb::{
    bson::Document,
    options::{FindOneAndUpdateOptions, FindOneOptions, FindOptions, ReturnDocument},
    Collection,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::DatabaseError;

/// Page requested by a client. Neither field set means "everything".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Paginate {
    pub page_number: Option<u64>,
    pub page_size: Option<u64>,
}

impl Paginate {
    pub const DEFAULT_PAGE_SIZE: u64 = 10;

    pub fn new(page_number: Option<u64>, page_size: Option<u64>) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    /// `(limit, skip)` for the requested page, or `None` when no paging was asked for
    pub fn window(&self) -> Option<(u64, u64)> {
        if self.page_number.is_none() && self.page_size.is_none() {
            return None;
        }

        // MongoDB takes limit and skip as i64
        let max = i64::MAX as u64;
        let limit = self
            .page_size
            .filter(|size| *size > 0)
            .unwrap_or(Self::DEFAULT_PAGE_SIZE)
            .min(max);
        let page = self.page_number.unwrap_or(1).max(1);

        Some((limit, (page - 1).saturating_mul(limit).min(max)))
    }
}

/// A slice of results plus the total number of matches
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: u64,
}

#[derive(Clone, Debug)]
pub struct EntityRepository<T> {
    collection: Collection<T>,
}

impl<T> EntityRepository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }

    pub async fn find_one(
        &self,
        filter: Document,
        options: Option<FindOneOptions>,
    ) -> Result<Option<T>, DatabaseError> {
        Ok(self.collection.find_one(filter, options).await?)
    }

    pub async fn find(
        &self,
        filter: Document,
        options: Option<FindOptions>,
    ) -> Result<Vec<T>, DatabaseError> {
        let cursor = self.collection.find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_with_pagination(
        &self,
        filter: Document,
        options: Option<FindOptions>,
        paginate: Paginate,
    ) -> Result<Page<T>, DatabaseError> {
        let mut options = options.unwrap_or_default();

        if let Some((limit, skip)) = paginate.window() {
            debug!(limit, skip, "Applying pagination window");
            options.limit = Some(limit as i64);
            options.skip = Some(skip);
        }

        let data = self.find(filter.clone(), Some(options)).await?;
        let count = self.collection.count_documents(filter, None).await?;

        Ok(Page { data, count })
    }

    pub async fn create(&self, entity: T) -> Result<T, DatabaseError> {
        match self.collection.insert_one(&entity, None).await {
            Ok(_) => Ok(entity),
            Err(e) => Err(DatabaseError::from_write(e)),
        }
    }

    /// Always hands back the document as it is after the update
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: Option<FindOneAndUpdateOptions>,
    ) -> Result<Option<T>, DatabaseError> {
        let mut options = options.unwrap_or_default();
        options.return_document = Some(ReturnDocument::After);

        self.collection
            .find_one_and_update(filter, update, options)
            .await
            .map_err(DatabaseError::from_write)
    }

    pub async fn delete_many(&self, filter: Document) -> Result<bool, DatabaseError> {
        let result = self.collection.delete_many(filter, None).await?;
        Ok(result.deleted_count >= 1)
    }
}

#[cfg(test)]
mod tests {
    use super::Paginate;

    #[test]
    fn no_paging_requested_means_no_window() {
        assert_eq!(Paginate::default().window(), None);
    }

    #[test]
    fn second_page_of_ten_skips_the_first_ten() {
        let paginate = Paginate::new(Some(2), Some(10));
        assert_eq!(paginate.window(), Some((10, 10)));
    }

    #[test]
    fn missing_size_falls_back_to_default() {
        let paginate = Paginate::new(Some(3), None);
        assert_eq!(paginate.window(), Some((10, 20)));
    }

    #[test]
    fn missing_page_starts_at_first() {
        let paginate = Paginate::new(None, Some(25));
        assert_eq!(paginate.window(), Some((25, 0)));
    }

    #[test]
    fn huge_page_number_saturates_the_skip() {
        let paginate = Paginate::new(Some(u64::MAX), Some(10));
        assert_eq!(paginate.window(), Some((10, i64::MAX as u64)));
    }

    #[test]
    fn huge_page_size_stays_a_positive_limit() {
        let (limit, skip) = Paginate::new(Some(1), Some(u64::MAX)).window().unwrap();
        assert_eq!(limit, i64::MAX as u64);
        assert!(limit as i64 > 0);
        assert_eq!(skip, 0);
    }

    #[test]
    fn zero_values_are_clamped() {
        let paginate = Paginate::new(Some(0), Some(0));
        assert_eq!(paginate.window(), Some((10, 0)));
    }
}
