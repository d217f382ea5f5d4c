#[derive(Debug)]
pub enum CacheOperation {
    Insert(u8, u8),
    InsertReleased(u8),
    Release(u8),
    TryGet(u8),
    Get(u8),
    ContainsKey(u8),
    Remove(u8),
    Count,
    Enumerate,
    AbandonEnumeration,
    GetOrInsertWith(u8, u8),
    Clear,
}

impl<'a> arbitrary::Arbitrary<'a> for CacheOperation {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        match u.int_in_range(0..=11)? {
            0 => Ok(CacheOperation::Insert(u.arbitrary()?, u.arbitrary()?)),
            1 => Ok(CacheOperation::InsertReleased(u.arbitrary()?)),
            2 => Ok(CacheOperation::Release(u.arbitrary()?)),
            3 => Ok(CacheOperation::TryGet(u.arbitrary()?)),
            4 => Ok(CacheOperation::Get(u.arbitrary()?)),
            5 => Ok(CacheOperation::ContainsKey(u.arbitrary()?)),
            6 => Ok(CacheOperation::Remove(u.arbitrary()?)),
            7 => Ok(CacheOperation::Count),
            8 => Ok(CacheOperation::Enumerate),
            9 => Ok(CacheOperation::AbandonEnumeration),
            10 => Ok(CacheOperation::GetOrInsertWith(
                u.arbitrary()?,
                u.arbitrary()?,
            )),
            11 => Ok(CacheOperation::Clear),
            _ => unreachable!(),
        }
    }
}
