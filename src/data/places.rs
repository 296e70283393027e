//! Static place-name to coordinate table.

use std::collections::HashMap;

use crate::data::preprocessing::Coordinate;
use crate::error::LookupError;

/// Bangkok districts and sub-districts. The source data listed "บางมด"
/// twice; the later coordinate is the one kept here.
pub const BANGKOK_PLACES: &[(&str, f64, f64)] = &[
    ("คลองต้นไทร", 13.725, 100.508),
    ("คลองสาน", 13.735, 100.504),
    ("บางลำภูล่าง", 13.715, 100.501),
    ("สมเด็จเจ้าพระยา", 13.731, 100.497),
    ("ทรายกองดิน", 13.854, 100.745),
    ("ทรายกองดินใต้", 13.861, 100.786),
    ("บางชัน", 13.839, 100.7),
    ("สามวาตะวันตก", 13.889, 100.708),
    ("สามวาตะวันออก", 13.896, 100.76),
    ("คลองตัน", 13.723, 100.571),
    ("คลองเตย", 13.71, 100.57),
    ("พระโขนง", 13.707, 100.595),
    ("คันนายาว", 13.821, 100.677),
    ("จตุจักร", 13.82861, 100.5597),
    ("จอมพล", 13.82861, 100.5597),
    ("จันทรเกษม", 13.82861, 100.5597),
    ("ลาดยาว", 13.826, 100.565),
    ("เสนานิคม", 13.82861, 100.5597),
    ("จอมทอง", 13.693, 100.468),
    ("บางขุนเทียน", 13.694, 100.45),
    ("บางค้อ", 13.702, 100.476),
    ("บางมด", 13.651, 100.51),
    ("สีกัน", 13.925, 100.593),
    ("ดินแดง", 13.778, 100.567),
    ("ดุสิต", 13.772, 100.513),
    ("ถนนนครไชยศรี", 13.789, 100.522),
    ("วชิรพยาบาล", 13.778, 100.505),
    ("สวนจิตรลดา", 13.767, 100.52),
    ("สี่แยกมหานาค", 13.758, 100.517),
    ("คลองชักพระ", 13.76, 100.456),
    ("ฉิมพลี", 13.786, 100.432),
    ("ตลิ่งชัน", 13.789, 100.459),
    ("บางพรม", 13.752, 100.442),
    ("บางระมาด", 13.767, 100.431),
    ("บางเชือกหนัง", 13.751, 100.419),
    ("ทวีวัฒนา", 13.758, 100.348),
    ("ศาลาธรรมสพน์", 13.783, 100.39),
    ("ทุ่งครุ", 13.614, 100.497),
    ("ดาวคะนอง", 13.725, 100.4858),
    ("ตลาดพลู", 13.715, 100.473),
    ("บางยี่เรือ", 13.72, 100.482),
    ("บุคคโล", 13.707, 100.486),
    ("วัดกัลยาณ์", 13.737, 100.493),
    ("สำเหร่", 13.725, 100.4858),
    ("หิรัญรูจี", 13.731, 100.49),
    ("บางขุนนนท์", 13.774, 100.466),
    ("บางขุนศรี", 13.76, 100.463),
    ("บ้านช่างหล่อ", 13.752, 100.477),
    ("ศิริราช", 13.759, 100.481),
    ("อรุณอมรินทร์", 13.772, 100.477),
    ("วัดท่าพระ", 13.733, 100.475),
    ("วัดอรุณ", 13.743, 100.486),
    ("คลองจั่น", 13.786, 100.635),
    ("หัวหมาก", 13.756, 100.66),
    ("ท่าข้าม", 13.555, 100.434),
    ("แสมดำ", 13.605, 100.395),
    ("บางคอแหลม", 13.696, 100.494),
    ("บางโคล่", 13.694, 100.516),
    ("วัดพระยาไกร", 13.706, 100.508),
    ("บางซื่อ", 13.82, 100.529),
    ("บางนา", 13.672, 100.616),
    ("บางบอน", 13.646, 100.37),
    ("บางบำหรุ", 13.781, 100.482),
    ("บางพลัด", 13.791, 100.487),
    ("บางยี่ขัน", 13.774, 100.492),
    ("บางอ้อ", 13.802, 100.512),
    ("บางรัก", 13.727, 100.527),
    ("มหาพฤฒาราม", 13.734, 100.52),
    ("สีลม", 13.73, 100.525),
    ("สี่พระยา", 13.725, 100.514),
    ("สุริยวงศ์", 13.724, 100.53),
    ("ท่าแร้ง", 13.866, 100.65),
    ("อนุสาวรีย์", 13.868, 100.606),
    ("บางแค", 13.698, 100.409),
    ("บางแคเหนือ", 13.72, 100.4),
    ("บางไผ่", 13.741, 100.385),
    ("หลักสอง", 13.683, 100.396),
    ("คลองกุ่ม", 13.808, 100.65),
    ("ปทุมวัน", 13.74, 100.535),
    ("รองเมือง", 13.744, 100.52),
    ("ลุมพินี", 13.736, 100.546),
    ("วังใหม่", 13.742, 100.526),
    ("ดอกไม้", 13.68, 100.689),
    ("ประเวศ", 13.719, 100.664),
    ("หนองบอน", 13.687, 100.656),
    ("คลองมหานาค", 13.753, 100.513),
    ("บ้านบาตร", 13.752, 100.507),
    ("ป้อมปราบ", 13.743, 100.514),
    ("วัดเทพศิรินทร์", 13.749, 100.512),
    ("วัดโสมนัส", 13.759, 100.511),
    ("สามเสนใน", 13.782, 100.545),
    ("ชนะสงคราม", 13.762, 100.495),
    ("ตลาดยอด", 13.76, 100.498),
    ("บวรนิเวศ", 13.757, 100.501),
    ("บางขุนพรหม", 13.765, 100.505),
    ("บ้านพานถม", 13.762, 100.503),
    ("พระบรมมหาราชวัง", 13.751, 100.492),
    ("วังบูรพาภิรมย์", 13.744, 100.499),
    ("วัดราชบพิธ", 13.75, 100.499),
    ("วัดสามพระยา", 13.768, 100.497),
    ("ศาลเจ้าพ่อเสือ", 13.754, 100.503),
    ("สำราญราษฎร์", 13.751, 100.5),
    ("เสาชิงช้า", 13.753, 100.626),
    ("บางจาก", 13.692, 100.423),
    ("คลองขวาง", 13.738, 100.457),
    ("คูหาสวรรค์", 13.727, 100.45),
    ("บางโพงพาง", 13.697, 100.538),
    ("ถนนพญาไท", 13.757, 100.559),
    ("ถนนเพชรบุรี", 13.752, 100.53),
    ("ทุ่งพญาไท", 13.763, 100.528),
    ("มักกะสัน", 13.752, 100.491),
    ("บางปะกอก", 13.675, 100.51),
    ("ราษฎร์บูรณะ", 13.67, 100.855),
    ("ขุมทอง", 13.736, 100.723),
    ("คลองสองต้นนุ่น", 13.753, 100.754),
    ("คลองสามประเวศ", 13.753, 100.815),
    ("ทับยาว", 13.728, 100.771),
    ("ลาดกระบัง", 13.723, 100.817),
    ("ลำปลาทิว", 13.765, 100.6),
    ("จรเข้บัว", 13.84, 100.612),
    ("ลาดพร้าว", 13.811, 100.609),
    ("วังทองหลาง", 13.779, 100.576),
    ("คลองตันเหนือ", 13.736, 100.56),
    ("คลองเตยเหนือ", 13.743, 100.596),
    ("พระโขนงเหนือ", 13.719, 100.628),
    ("สวนหลวง", 13.726, 100.688),
    ("สะพานสูง", 13.761, 100.504),
    ("จักรวรรดิ", 13.741, 100.513),
    ("ตลาดน้อย", 13.734, 100.511),
    ("สัมพันธวงศ์", 13.739, 100.541),
    ("ทุ่งมหาเมฆ", 13.718, 100.532),
    ("ทุ่งวัดดอน", 13.71, 100.514),
    ("ยานนาวา", 13.714, 100.63),
    ("คลองถนน", 13.898, 100.654),
    ("สายไหม", 13.921, 100.672),
    ("กระทุ่มราย", 13.823, 100.82),
    ("คลองสิบ", 13.914, 100.88),
    ("คลองสิบสอง", 13.914, 100.81),
    ("คู้ฝั่งเหนือ", 13.872, 100.877),
    ("ลำต้อยติ่ง", 13.781, 100.844),
    ("ลำผักชี", 13.797, 100.885),
    ("หนองจอก", 13.869, 100.836),
    ("โคกแฝด", 13.84, 100.351),
    ("หนองค้างพลู", 13.714, 100.358),
    ("หนองแขม", 13.68, 100.58),
    ("ตลาดบางเขน", 13.871, 100.564),
    ("ทุ่งสองห้อง", 13.883, 100.586),
    ("บางกะปิ", 13.752, 100.579),
    ("สามเสนนอก", 13.796, 100.577),
    ("ห้วยขวาง", 13.769, 100.577),
];

#[derive(Debug, Clone)]
pub struct PlaceTable {
    entries: Vec<(String, Coordinate)>,
    index: HashMap<String, usize>,
}

impl PlaceTable {
    /// Builds a table, refusing duplicate names instead of silently
    /// overwriting.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, LookupError>
    where
        I: IntoIterator<Item = (S, Coordinate)>,
        S: Into<String>,
    {
        let mut table = PlaceTable {
            entries: Vec::new(),
            index: HashMap::new(),
        };
        for (name, coordinate) in entries {
            let name = name.into();
            if table.index.contains_key(&name) {
                return Err(LookupError::DuplicatePlace { name });
            }
            table.index.insert(name.clone(), table.entries.len());
            table.entries.push((name, coordinate));
        }
        Ok(table)
    }

    /// The built-in district and sub-district table.
    pub fn bangkok() -> Self {
        let table = BANGKOK_PLACES
            .iter()
            .map(|&(name, lat, lon)| {
                Coordinate::new(lat, lon)
                    .map(|c| (name, c))
                    .map_err(|e| format!("{name}: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()
            .and_then(|entries| Self::from_entries(entries).map_err(|e| e.to_string()));
        table.expect("built-in places are unique and in range")
    }

    pub fn lookup(&self, name: &str) -> Result<Coordinate, LookupError> {
        self.index
            .get(name.trim())
            .map(|&i| self.entries[i].1)
            .ok_or_else(|| LookupError::UnknownPlace {
                name: name.to_string(),
            })
    }

    /// Names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Coordinate)> {
        self.entries.iter().map(|(name, c)| (name.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PlaceTable {
    fn default() -> Self {
        Self::bangkok()
    }
}
