use std::fmt;

/// Logical product fields read from a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Price,
    PriceWhole,
    PriceFraction,
    Image,
    Categories,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Title,
        Field::Price,
        Field::PriceWhole,
        Field::PriceFraction,
        Field::Image,
        Field::Categories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Price => "price",
            Field::PriceWhole => "price-whole",
            Field::PriceFraction => "price-fraction",
            Field::Image => "image",
            Field::Categories => "categories",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
