use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]

pub struct Respond{
    pub(crate) code:u16,
    pub(crate) msg:String
}
