// vim: tw=80
mod po2zone;

use util::*;
